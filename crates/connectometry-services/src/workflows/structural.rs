// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Structural connectometry: nodes → tractography → streamline matrix.
*/

use super::Pipeline;
use crate::artifacts::GraphArtifacts;
use crate::types::*;
use connectometry_estimation::{edge_threshold, normalize};
use connectometry_volume::{read_matrix, read_volume};
use std::path::PathBuf;
use tracing::{error, info};

/// File inside the diffusion directory that anchors the output directory
pub const BRAIN_MASK_FILE: &str = "nodif_brain_mask.nii.gz";

impl Pipeline {
    /// Run one structural workflow
    ///
    /// Returns the path of the written structural estimate, or `None` when
    /// the tractography backend failed at runtime (logged, not propagated).
    pub fn run_structural(&self, run: &StructuralRun) -> PipelineResult<Option<PathBuf>> {
        let tractography = self.tractography.as_ref().ok_or_else(|| {
            PipelineError::InvalidInput("no tractography backend configured".to_string())
        })?;
        let anchor = run.diffusion_dir.join(BRAIN_MASK_FILE);
        info!(
            "Structural run for subject {} in {}",
            run.subject_id,
            run.diffusion_dir.display()
        );

        let prepared = self.prepare_nodes(
            &run.subject_id,
            &run.atlas,
            &anchor,
            run.network,
            run.mask.as_deref(),
            || Ok(read_volume(&anchor)?.grid()),
        )?;
        let nodes = &prepared.nodes;

        let writer = self.writer(&prepared.paths, run.network, run.plot);
        let region_volumes = if nodes.is_parcellated() {
            writer.write_region_volumes(nodes)?
        } else {
            Vec::new()
        };

        let estimate_path = prepared.paths.structural_estimate();
        let request = StructuralRequest {
            subject_id: &run.subject_id,
            diffusion_dir: &run.diffusion_dir,
            network: run.network,
            nodes,
            node_radius: run.node_radius,
            anatomical: run.anatomical.as_deref(),
            threads: run.threads,
            output_dir: &prepared.output_dir,
            region_volumes: &region_volumes,
            estimate_path: &estimate_path,
            plot: run.plot,
        };

        let written = tractography
            .prepare_masks(&request)
            .and_then(|masks| tractography.run_struct_mapping(&request, &masks));
        let written = match written {
            Ok(path) => path,
            Err(TractographyError::Runtime(reason)) => {
                error!(
                    "Whole-brain Structural Graph Estimation Failed! {}",
                    reason
                );
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if run.plot {
            let matrix = normalize(&read_matrix(&written)?);
            let threshold = edge_threshold(0.0);
            writer.render(&GraphArtifacts {
                matrix: &matrix,
                nodes,
                model: None,
                edge_threshold: &threshold,
                signal: None,
            });
        }

        Ok(Some(written))
    }
}
