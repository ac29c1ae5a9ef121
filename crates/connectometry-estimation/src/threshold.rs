// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Thresholding policies and normalization.

Exactly one policy applies to a run, chosen from [`ThresholdConfig`] by
precedence: adaptive, then fixed proportional (no density target), then
density.

All edge counts use the upper triangle only; matrices are mirrored back to
stay symmetric.
*/

use crate::{EstimationError, EstimationResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// User-facing threshold parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Proportion of strongest edges kept, in `[0, 1]`
    pub thr: f64,
    /// Target edge density in `(0, 1]`
    pub dens_thresh: Option<f64>,
    /// Use the structural connectome to pick the threshold
    pub adapt_thresh: bool,
}

impl ThresholdConfig {
    pub fn new(thr: f64, dens_thresh: Option<f64>, adapt_thresh: bool) -> EstimationResult<Self> {
        let config = Self {
            thr,
            dens_thresh,
            adapt_thresh,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EstimationResult<()> {
        if !(0.0..=1.0).contains(&self.thr) {
            return Err(EstimationError::InvalidParameter(format!(
                "thr must be within [0, 1], got {}",
                self.thr
            )));
        }
        if let Some(dens) = self.dens_thresh {
            if !(dens > 0.0 && dens <= 1.0) {
                return Err(EstimationError::InvalidParameter(format!(
                    "dens_thresh must be within (0, 1], got {}",
                    dens
                )));
            }
        }
        Ok(())
    }

    /// The single policy these parameters select
    pub fn policy(&self) -> ThresholdPolicy {
        if self.adapt_thresh {
            ThresholdPolicy::Adaptive
        } else if let Some(dens) = self.dens_thresh {
            ThresholdPolicy::Density(dens)
        } else {
            ThresholdPolicy::Proportional(self.thr)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdPolicy {
    /// Threshold chosen to best match the structural connectome
    Adaptive,
    /// Keep this proportion of the strongest edges
    Proportional(f64),
    /// Raise an absolute cutoff until the density is at most this target
    Density(f64),
}

impl ThresholdPolicy {
    /// File name tag: `<thr>`, `<dens>dens` or `adapt`
    pub fn tag(&self) -> String {
        match self {
            ThresholdPolicy::Adaptive => "adapt".to_string(),
            ThresholdPolicy::Proportional(thr) => python_float(*thr),
            ThresholdPolicy::Density(dens) => format!("{}dens", python_float(*dens)),
        }
    }
}

/// Search parameters for the density and adaptive policies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSettings {
    pub density_step: f64,
    pub density_ceiling: f64,
    pub adaptive_step: f64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            density_step: 0.01,
            density_ceiling: 0.5,
            adaptive_step: 0.01,
        }
    }
}

/// Format a float the way Python's `str(float)` does for ordinary values
/// (`0.5`, `50.0`, `7.000000000000001`)
pub fn python_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Display threshold for rendering, e.g. `0.5` → `"50.0%"`
pub fn edge_threshold(proportion: f64) -> String {
    format!("{}%", python_float(proportion * 100.0))
}

fn upper_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

/// Keep the `round(p · n(n-1)/2)` strongest upper-triangle edges by magnitude
pub fn threshold_proportional(matrix: &Array2<f64>, proportion: f64) -> Array2<f64> {
    let n = matrix.nrows();
    let mut edges: Vec<(usize, usize)> = upper_pairs(n).collect();
    let keep = (proportion.clamp(0.0, 1.0) * edges.len() as f64).round() as usize;

    // stable sort keeps row-major order among equal weights
    edges.sort_by(|a, b| matrix[[b.0, b.1]].abs().total_cmp(&matrix[[a.0, a.1]].abs()));

    let mut out = Array2::zeros((n, n));
    for &(i, j) in edges.iter().take(keep) {
        out[[i, j]] = matrix[[i, j]];
        out[[j, i]] = matrix[[i, j]];
    }
    out
}

/// Zero every entry whose magnitude is below `cutoff`
pub fn threshold_absolute(matrix: &Array2<f64>, cutoff: f64) -> Array2<f64> {
    matrix.mapv(|v| if v.abs() < cutoff { 0.0 } else { v })
}

/// 1 for non-zero entries, 0 elsewhere
pub fn binarize(matrix: &Array2<f64>) -> Array2<f64> {
    matrix.mapv(|v| if v != 0.0 { 1.0 } else { 0.0 })
}

/// Non-zero upper-triangle edges over `n(n-1)/2`; 0 for fewer than 2 nodes
pub fn density(matrix: &Array2<f64>) -> f64 {
    let n = matrix.nrows();
    if n < 2 {
        return 0.0;
    }
    let possible = n * (n - 1) / 2;
    let present = upper_pairs(n).filter(|&(i, j)| matrix[[i, j]] != 0.0).count();
    present as f64 / possible as f64
}

/// `|W| / max|W|` with a zero diagonal; an all-zero matrix stays zero
pub fn normalize(matrix: &Array2<f64>) -> Array2<f64> {
    let mut out = matrix.mapv(f64::abs);
    out.diag_mut().fill(0.0);
    let max = out.iter().fold(0.0f64, |m, v| m.max(*v));
    if max > 0.0 && max.is_finite() {
        out.mapv_inplace(|v| v / max);
    }
    out
}

/// Raise an absolute cutoff in `step`s until the density drops to `target`
/// or the cutoff passes `ceiling`. Returns the thresholded matrix and the
/// cutoff reached.
pub fn density_search(matrix: &Array2<f64>, target: f64, settings: &ThresholdSettings) -> (Array2<f64>, f64) {
    let base = normalize(matrix);
    let mut current = base.clone();
    let mut cutoff = 0.0;
    let mut step = 0usize;
    while cutoff <= settings.density_ceiling + 1e-12 && density(&current) > target {
        step += 1;
        cutoff = step as f64 * settings.density_step;
        current = threshold_absolute(&base, cutoff);
    }
    debug!(
        target,
        cutoff,
        density = density(&current),
        "Density thresholding finished"
    );
    (current, cutoff)
}

/// False positives plus false negatives of `candidate` against `reference`,
/// both binary, over the upper triangle
fn edge_disagreement(candidate: &Array2<f64>, reference: &Array2<f64>) -> usize {
    upper_pairs(candidate.nrows())
        .filter(|&(i, j)| candidate[[i, j]] != reference[[i, j]])
        .count()
}

/// Sweep proportional thresholds `step, 2·step, …, 1.0` and return the first
/// one whose binarized graph disagrees least with the structural graph,
/// together with the thresholded matrix
pub fn adaptive_search(
    functional: &Array2<f64>,
    structural: &Array2<f64>,
    step: f64,
) -> EstimationResult<(Array2<f64>, f64)> {
    if structural.dim() != functional.dim() {
        return Err(EstimationError::DimensionMismatch {
            expected: functional.dim(),
            actual: structural.dim(),
        });
    }
    if !(step > 0.0 && step <= 1.0) {
        return Err(EstimationError::InvalidParameter(format!(
            "adaptive step must be within (0, 1], got {}",
            step
        )));
    }

    let reference = binarize(structural);
    let steps = (1.0 / step).round().max(1.0) as usize;

    let mut best: Option<(usize, f64, Array2<f64>)> = None;
    for k in 1..=steps {
        let thr = (k as f64 * step).min(1.0);
        let candidate = threshold_proportional(functional, thr);
        let errors = edge_disagreement(&binarize(&candidate), &reference);
        if best.as_ref().map_or(true, |(e, _, _)| errors < *e) {
            best = Some((errors, thr, candidate));
        }
    }

    match best {
        Some((errors, thr, matrix)) => {
            debug!(thr, errors, "Adaptive threshold selected");
            Ok((matrix, thr))
        }
        None => Err(EstimationError::Degenerate("no thresholds to sweep".to_string())),
    }
}
