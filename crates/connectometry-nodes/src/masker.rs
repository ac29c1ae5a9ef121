// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Spatial masking of node sets with a binary region-of-interest volume.

Coordinates are kept when they land on a non-zero mask voxel. Parcels are
truncated to the voxels whose world position lands inside the mask and
dropped when nothing is left; truncated parcels get a fresh centroid.
*/

use crate::{Node, NodeGeometry, NodeLayout, NodeResult, NodeSet, Parcel};
use connectometry_volume::{read_volume, Volume};
use std::path::Path;
use tracing::info;

/// Mask name used in file names: basename up to the first `.`
pub fn mask_name(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.split('.').next().unwrap_or_default().to_string()
}

pub struct SpatialMasker {
    mask: Volume,
    name: String,
}

impl SpatialMasker {
    pub fn new(mask: Volume, name: impl Into<String>) -> Self {
        Self {
            mask,
            name: name.into(),
        }
    }

    pub fn load(path: &Path) -> NodeResult<Self> {
        Ok(Self::new(read_volume(path)?, mask_name(path)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mask(&self) -> &Volume {
        &self.mask
    }

    pub fn apply(&self, nodes: &NodeSet) -> NodeResult<NodeSet> {
        let kept: Vec<Node> = match nodes.layout() {
            NodeLayout::Coordinates => nodes
                .nodes()
                .iter()
                .filter(|node| self.mask.is_nonzero_at(node.location()))
                .cloned()
                .collect(),
            NodeLayout::Parcels(grid) => nodes
                .nodes()
                .iter()
                .filter_map(|node| {
                    let parcel = node.parcel()?;
                    let voxels: Vec<_> = parcel
                        .voxels
                        .iter()
                        .copied()
                        .filter(|v| self.mask.is_nonzero_at(grid.world_of(*v)))
                        .collect();
                    let truncated = Parcel::from_voxels(parcel.label_value, voxels, grid)?;
                    Some(Node {
                        geometry: NodeGeometry::Parcel(truncated),
                        ..node.clone()
                    })
                })
                .collect(),
        };

        info!(
            mask = %self.name,
            kept = kept.len(),
            total = nodes.len(),
            "Applied spatial mask"
        );
        nodes.derive(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectometry_volume::{Affine, VoxelGrid};
    use ndarray::Array3;

    #[test]
    fn test_mask_name() {
        assert_eq!(mask_name(Path::new("/data/roi_pcc.nii.gz")), "roi_pcc");
        assert_eq!(mask_name(Path::new("mask")), "mask");
    }

    #[test]
    fn test_parcel_is_truncated_and_recentred() {
        let grid = VoxelGrid::new([4, 1, 1], Affine::identity());
        let parcel = Parcel::from_voxels(1.0, vec![[0, 0, 0], [1, 0, 0], [2, 0, 0]], &grid).unwrap();
        let outside = Parcel::from_voxels(2.0, vec![[3, 0, 0]], &grid).unwrap();
        let set = NodeSet::new(
            "atlas",
            NodeLayout::Parcels(grid),
            vec![
                Node {
                    index: 0,
                    label: "a".into(),
                    geometry: NodeGeometry::Parcel(parcel),
                },
                Node {
                    index: 1,
                    label: "b".into(),
                    geometry: NodeGeometry::Parcel(outside),
                },
            ],
        )
        .unwrap();

        let mut mask = Array3::zeros((4, 1, 1));
        mask[[1, 0, 0]] = 1.0;
        mask[[2, 0, 0]] = 1.0;
        let masker = SpatialMasker::new(Volume::new(mask, Affine::identity()), "roi");

        let masked = masker.apply(&set).unwrap();
        assert_eq!(masked.len(), 1);
        let kept = masked.nodes()[0].parcel().unwrap();
        assert_eq!(kept.voxels, vec![[1, 0, 0], [2, 0, 0]]);
        assert_eq!(kept.centroid, [1.5, 0.0, 0.0]);
        assert_eq!(masked.labels(), vec!["a"]);
    }
}
