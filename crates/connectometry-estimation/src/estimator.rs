// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Fit, threshold and normalize in one step.
*/

use crate::threshold::{
    adaptive_search, density_search, edge_threshold, normalize, threshold_proportional,
};
use crate::{
    ConnectivityModel, EstimationError, EstimationResult, SignalMatrix, ThresholdConfig,
    ThresholdPolicy, ThresholdSettings,
};
use ndarray::Array2;
use tracing::info;

/// Finalized matrix plus how it was thresholded
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholded {
    /// Symmetric, zero diagonal, entries in `[0, 1]`
    pub matrix: Array2<f64>,
    pub policy: ThresholdPolicy,
    /// Proportion (proportional, adaptive) or absolute cutoff (density) applied
    pub effective_threshold: f64,
    /// `effective_threshold` as a percent string for renderers, e.g. `"50.0%"`
    pub edge_threshold: String,
}

#[derive(Debug, Clone)]
pub struct ConnectivityEstimator {
    model: ConnectivityModel,
    config: ThresholdConfig,
    settings: ThresholdSettings,
}

impl ConnectivityEstimator {
    pub fn new(
        model: ConnectivityModel,
        config: ThresholdConfig,
        settings: ThresholdSettings,
    ) -> EstimationResult<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            settings,
        })
    }

    pub fn model(&self) -> ConnectivityModel {
        self.model
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.config.policy()
    }

    /// Fit the model and apply the configured policy. The adaptive policy
    /// needs the structural matrix of the same node set.
    pub fn estimate(
        &self,
        signal: &SignalMatrix,
        structural: Option<&Array2<f64>>,
    ) -> EstimationResult<Thresholded> {
        let fitted = self.model.fit(signal)?;
        let policy = self.config.policy();

        let (matrix, effective_threshold) = match policy {
            ThresholdPolicy::Adaptive => {
                let structural = structural.ok_or_else(|| {
                    EstimationError::InvalidParameter(
                        "adaptive thresholding needs a structural matrix".to_string(),
                    )
                })?;
                let (matrix, thr) = adaptive_search(&fitted, structural, self.settings.adaptive_step)?;
                (matrix, thr)
            }
            ThresholdPolicy::Proportional(thr) => (threshold_proportional(&fitted, thr), thr),
            ThresholdPolicy::Density(target) => density_search(&fitted, target, &self.settings),
        };

        let matrix = normalize(&matrix);
        info!(
            model = self.model.id(),
            policy = %policy.tag(),
            threshold = effective_threshold,
            nodes = matrix.nrows(),
            "Estimated connectivity matrix"
        );
        Ok(Thresholded {
            matrix,
            policy,
            effective_threshold,
            edge_threshold: edge_threshold(effective_threshold),
        })
    }
}
