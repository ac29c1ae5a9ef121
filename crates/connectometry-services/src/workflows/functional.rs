// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Functional connectometry: nodes → signals → thresholded connectivity.
*/

use super::Pipeline;
use crate::artifacts::GraphArtifacts;
use crate::paths::OutputPaths;
use crate::types::*;
use connectometry_estimation::{ConnectivityEstimator, EstimationError, ThresholdPolicy};
use connectometry_volume::{read_matrix, read_series};
use ndarray::Array2;
use std::io;
use std::path::Path;
use tracing::{debug, info};

impl Pipeline {
    /// Run one functional workflow (whole-brain when `run.network` is `None`)
    ///
    /// # Errors
    /// * `PipelineError::PrerequisiteMissing` / `PrerequisiteLookup` - adaptive
    ///   thresholding without a readable structural estimate (fatal)
    /// * `PipelineError::Alignment` - signal columns disagree with the nodes
    /// * `PipelineError::Estimation` - degenerate input, including an empty
    ///   node set after selection or masking
    pub fn run_functional(&self, run: &FunctionalRun) -> PipelineResult<ThresholdResult> {
        info!(
            "Functional run for subject {} ({})",
            run.subject_id,
            run.network.map_or("whole brain".to_string(), |n| n.to_string())
        );

        let prepared = self.prepare_nodes(
            &run.subject_id,
            &run.atlas,
            &run.input,
            run.network,
            run.mask.as_deref(),
            || Ok(read_series(&run.input)?.grid()),
        )?;
        let nodes = &prepared.nodes;

        if nodes.is_empty() {
            return Err(EstimationError::Degenerate(format!(
                "no nodes left for subject {} after selection and masking",
                run.subject_id
            ))
            .into());
        }

        let signal = self.extractor.extract(&ExtractionRequest {
            input: &run.input,
            nodes,
            node_radius: run.node_radius,
            confounds: run.confounds.as_deref(),
            standardize: self.settings.standardize,
        })?;

        let labels = nodes.labels();
        if labels.len() != nodes.len() || signal.nodes() != nodes.len() {
            return Err(PipelineError::Alignment(format!(
                "{} labels, {} nodes, {} signal columns",
                labels.len(),
                nodes.len(),
                signal.nodes()
            )));
        }

        let writer = self.writer(&prepared.paths, run.network, run.plot);
        writer.write_timeseries(&signal)?;

        let estimator = ConnectivityEstimator::new(run.model, run.threshold, self.settings.thresholds)?;
        let structural = match estimator.policy() {
            ThresholdPolicy::Adaptive => Some(load_structural_estimate(&prepared.paths)?),
            _ => None,
        };

        let result = estimator.estimate(&signal, structural.as_ref())?;
        let estimate_path = writer.write_estimate(&result.matrix, run.model, &result.policy)?;

        if run.plot {
            writer.render(&GraphArtifacts {
                matrix: &result.matrix,
                nodes,
                model: Some(run.model),
                edge_threshold: &result.edge_threshold,
                signal: Some(&signal),
            });
        }

        Ok(ThresholdResult {
            matrix: result.matrix,
            estimate_path,
            edge_threshold: result.edge_threshold,
            effective_threshold: result.effective_threshold,
            output_dir: prepared.output_dir,
            labels,
        })
    }
}

/// Structural matrix for adaptive thresholding
fn load_structural_estimate(paths: &OutputPaths) -> PipelineResult<Array2<f64>> {
    read_structural_estimate(&paths.structural_estimate(), |path| path.try_exists())
}

/// `lookup` reports whether `path` exists; a lookup error is fatal like a
/// missing file
fn read_structural_estimate(
    path: &Path,
    lookup: impl FnOnce(&Path) -> io::Result<bool>,
) -> PipelineResult<Array2<f64>> {
    match lookup(path) {
        Ok(true) => {
            debug!("Loading structural estimate {}", path.display());
            Ok(read_matrix(path)?)
        }
        Ok(false) => Err(PipelineError::PrerequisiteMissing(path.to_path_buf())),
        Err(e) => Err(PipelineError::PrerequisiteLookup {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectometry_volume::write_matrix;

    #[test]
    fn test_lookup_error_is_fatal() {
        let path = Path::new("/subjects/997/atlas_aal/997_structural_est.txt");
        let err = read_structural_estimate(path, |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        })
        .unwrap_err();

        match &err {
            PipelineError::PrerequisiteLookup { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("denied"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_estimate_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("997_structural_est.txt");
        let err = read_structural_estimate(&path, |p| p.try_exists()).unwrap_err();
        assert!(matches!(err, PipelineError::PrerequisiteMissing(ref p) if p == &path));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_existing_estimate_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("997_structural_est.txt");
        write_matrix(&path, &Array2::from_elem((3, 3), 2.0)).unwrap();

        let matrix = read_structural_estimate(&path, |p| p.try_exists()).unwrap();
        assert_eq!(matrix.dim(), (3, 3));
        assert_eq!(matrix[[1, 2]], 2.0);
    }
}
