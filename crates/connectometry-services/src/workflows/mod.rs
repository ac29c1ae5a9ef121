// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Per-subject workflows.

Both workflows run the same node pipeline (resolve, select, mask, persist)
and differ in how the matrix is built: functional runs extract signals and
estimate connectivity, structural runs hand the nodes to a tractography
backend.
*/

pub mod functional;
pub mod structural;

use crate::artifacts::ArtifactWriter;
use crate::paths::OutputPaths;
use crate::traits::{Renderer, SignalExtractor, TractographyService};
use crate::types::*;
use connectometry_nodes::{
    AtlasCatalog, AtlasRequest, AtlasResolver, Network, NodeSelector, NodeSet, SpatialMasker,
};
use connectometry_volume::VoxelGrid;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Collaborators and settings shared by every run of a batch
pub struct Pipeline {
    settings: PipelineSettings,
    resolver: AtlasResolver,
    extractor: Arc<dyn SignalExtractor>,
    renderer: Arc<dyn Renderer>,
    tractography: Option<Arc<dyn TractographyService>>,
}

/// Node set of one run after selection and masking, already persisted
pub(crate) struct PreparedNodes {
    pub nodes: NodeSet,
    pub paths: OutputPaths,
    pub output_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        extractor: Arc<dyn SignalExtractor>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let resolver = AtlasResolver::new(AtlasCatalog::new(settings.atlas_dir.clone()));
        Self {
            settings,
            resolver,
            extractor,
            renderer,
            tractography: None,
        }
    }

    pub fn with_tractography(mut self, tractography: Arc<dyn TractographyService>) -> Self {
        self.tractography = Some(tractography);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub(crate) fn writer<'a>(
        &'a self,
        paths: &'a OutputPaths,
        network: Option<Network>,
        plot: bool,
    ) -> ArtifactWriter<'a> {
        let writer = ArtifactWriter::new(paths, network, self.settings.plotting);
        if plot {
            writer.with_renderer(self.renderer.as_ref())
        } else {
            writer
        }
    }

    /// Resolve, select and mask the nodes of one run, then persist them
    ///
    /// `anchor` is the volume whose directory hosts the atlas output
    /// directory; `reference` is the field of view used for network
    /// selection and is only evaluated when a network is requested.
    pub(crate) fn prepare_nodes(
        &self,
        subject_id: &str,
        atlas: &AtlasRequest,
        anchor: &Path,
        network: Option<Network>,
        mask: Option<&Path>,
        reference: impl FnOnce() -> PipelineResult<VoxelGrid>,
    ) -> PipelineResult<PreparedNodes> {
        let resolved = self.resolver.resolve(atlas, anchor)?;
        let mut nodes = resolved.nodes;

        if let Some(network) = network {
            let selector = NodeSelector::load(&self.settings.network_template_path())?;
            nodes = selector.select(&nodes, network, &reference()?)?;
            if nodes.is_empty() {
                warn!(
                    "No nodes of {} fall in the {} network",
                    resolved.output_dir.display(),
                    network
                );
            }
        }

        if let Some(mask_path) = mask {
            let masker = SpatialMasker::load(mask_path)?;
            let before = nodes.len();
            nodes = masker.apply(&nodes)?;
            info!(
                "Mask {} kept {} of {} nodes",
                masker.name(),
                nodes.len(),
                before
            );
        }

        let paths = OutputPaths::new(&resolved.output_dir, subject_id, network, mask);
        let writer = ArtifactWriter::new(&paths, network, self.settings.plotting);
        writer.write_node_lists(&nodes)?;
        writer.write_parcels(&nodes)?;

        Ok(PreparedNodes {
            nodes,
            paths,
            output_dir: resolved.output_dir,
        })
    }
}
