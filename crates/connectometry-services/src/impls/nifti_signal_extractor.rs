// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Signal extraction from NIfTI series.

Coordinate nodes average the voxels inside a sphere of `node_radius` mm
around the coordinate; when the sphere holds no voxel centre the nearest
voxel is used. Parcel nodes average their voxels, mapped into the series grid
when the atlas grid differs.
*/

use crate::traits::SignalExtractor;
use crate::types::*;
use connectometry_estimation::{linalg, SignalMatrix};
use connectometry_nodes::{Node, NodeGeometry};
use connectometry_volume::{read_matrix, read_series, SeriesVolume, VoxelGrid, VoxelIndex, WorldCoordinate};
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Default implementation of SignalExtractor
#[derive(Debug, Default, Clone, Copy)]
pub struct NiftiSignalExtractor;

impl NiftiSignalExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SignalExtractor for NiftiSignalExtractor {
    fn extract(&self, request: &ExtractionRequest<'_>) -> ServiceResult<SignalMatrix> {
        if request.nodes.is_empty() {
            return Err(ServiceError::InvalidInput(
                "cannot extract signals for an empty node set".to_string(),
            ));
        }
        if request.node_radius.is_nan() || request.node_radius < 0.0 {
            return Err(ServiceError::InvalidInput(format!(
                "node radius must be non-negative, got {}",
                request.node_radius
            )));
        }

        let series = read_series(request.input)?;
        debug!(
            "Extracting {} nodes from {} time points of {}",
            request.nodes.len(),
            series.len(),
            request.input.display()
        );

        let atlas_grid = request.nodes.parcel_grid();
        let columns: Vec<Vec<f64>> = request
            .nodes
            .nodes()
            .par_iter()
            .map(|node| node_signal(&series, atlas_grid, node, request.node_radius))
            .collect::<ServiceResult<_>>()?;

        let observations = series.len();
        let mut data = Array2::<f64>::zeros((observations, columns.len()));
        for (j, column) in columns.iter().enumerate() {
            for (t, value) in column.iter().enumerate() {
                data[[t, j]] = *value;
            }
        }

        if let Some(confounds_path) = request.confounds {
            let confounds = read_matrix(confounds_path)?;
            if confounds.nrows() != observations {
                return Err(ServiceError::InvalidInput(format!(
                    "confounds {} have {} rows, series has {} time points",
                    confounds_path.display(),
                    confounds.nrows(),
                    observations
                )));
            }
            data = linalg::regress_out(&data, &confounds)?;
        }

        if request.standardize {
            data = linalg::zscore_columns(&data);
        }

        Ok(SignalMatrix::new(data))
    }
}

fn node_signal(
    series: &SeriesVolume,
    atlas_grid: Option<&VoxelGrid>,
    node: &Node,
    radius: f64,
) -> ServiceResult<Vec<f64>> {
    let grid = series.grid();
    let voxels = match &node.geometry {
        NodeGeometry::Coordinate(center) => {
            let voxels = sphere_voxels(&grid, *center, radius);
            if voxels.is_empty() {
                let nearest = grid.nearest_voxel(*center).ok_or_else(|| {
                    ServiceError::InvalidInput(format!(
                        "node {} ('{}') at {:?} lies outside the input volume",
                        node.index, node.label, center
                    ))
                })?;
                vec![nearest]
            } else {
                voxels
            }
        }
        NodeGeometry::Parcel(parcel) => {
            let mut mapped: Vec<VoxelIndex> = parcel
                .voxels
                .iter()
                .filter_map(|v| map_voxel(atlas_grid, &grid, *v))
                .collect();
            mapped.sort_unstable();
            mapped.dedup();
            mapped
        }
    };

    if voxels.is_empty() {
        warn!(
            "Node {} ('{}') covers no voxel of the input volume; its signal is zero",
            node.index, node.label
        );
        return Ok(vec![0.0; series.len()]);
    }

    let mut sum = vec![0.0f64; series.len()];
    for voxel in &voxels {
        for (acc, value) in sum.iter_mut().zip(series.voxel_series(*voxel).iter()) {
            *acc += *value as f64;
        }
    }
    let n = voxels.len() as f64;
    Ok(sum.into_iter().map(|s| s / n).collect())
}

/// Atlas voxel to series voxel, through world space when the grids differ
fn map_voxel(atlas_grid: Option<&VoxelGrid>, grid: &VoxelGrid, voxel: VoxelIndex) -> Option<VoxelIndex> {
    match atlas_grid {
        Some(atlas) if atlas != grid => grid.nearest_voxel(atlas.world_of(voxel)),
        _ => grid.contains(voxel).then_some(voxel),
    }
}

/// Voxels whose centres lie within `radius` mm of `center`
fn sphere_voxels(grid: &VoxelGrid, center: WorldCoordinate, radius: f64) -> Vec<VoxelIndex> {
    let fractional = grid.affine.world_to_voxel(center);
    let size = grid.affine.voxel_size();
    let mut lo = [0usize; 3];
    let mut hi = [0usize; 3];
    for axis in 0..3 {
        let reach = if size[axis] > 0.0 { radius / size[axis] } else { 0.0 };
        let from = (fractional[axis] - reach).floor().max(0.0);
        let to = (fractional[axis] + reach).ceil();
        if !from.is_finite() || !to.is_finite() || to < 0.0 || grid.shape[axis] == 0 {
            return Vec::new();
        }
        lo[axis] = from as usize;
        hi[axis] = (to as usize).min(grid.shape[axis] - 1);
        if lo[axis] > hi[axis] {
            return Vec::new();
        }
    }

    let r2 = radius * radius;
    let mut voxels = Vec::new();
    for i in lo[0]..=hi[0] {
        for j in lo[1]..=hi[1] {
            for k in lo[2]..=hi[2] {
                let world = grid.world_of([i, j, k]);
                let d2: f64 = (0..3).map(|a| (world[a] - center[a]).powi(2)).sum();
                if d2 <= r2 {
                    voxels.push([i, j, k]);
                }
            }
        }
    }
    voxels
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectometry_nodes::{NodeLayout, NodeSet, Parcel};
    use connectometry_volume::{write_volume, Affine, Volume};
    use ndarray::Array3;
    use std::path::Path;

    fn grid() -> VoxelGrid {
        VoxelGrid::new([5, 5, 5], Affine::scaled([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]).unwrap())
    }

    /// Single time point volume whose value is the voxel's x index
    fn write_gradient(path: &Path) {
        let data = Array3::from_shape_fn((5, 5, 5), |(i, _, _)| i as f32);
        write_volume(path, &Volume::new(data, grid().affine)).unwrap();
    }

    fn coordinate_nodes(points: &[WorldCoordinate]) -> NodeSet {
        let nodes = points
            .iter()
            .enumerate()
            .map(|(index, c)| Node {
                index,
                label: format!("n{}", index),
                geometry: NodeGeometry::Coordinate(*c),
            })
            .collect();
        NodeSet::new("coords", NodeLayout::Coordinates, nodes).unwrap()
    }

    #[test]
    fn test_sphere_membership() {
        let g = grid();
        assert_eq!(sphere_voxels(&g, [4.0, 4.0, 4.0], 0.0), vec![[2, 2, 2]]);
        // six face neighbours plus the centre
        assert_eq!(sphere_voxels(&g, [4.0, 4.0, 4.0], 2.0).len(), 7);
        // clipped at the grid corner
        assert_eq!(sphere_voxels(&g, [0.0, 0.0, 0.0], 2.0).len(), 4);
        assert!(sphere_voxels(&g, [100.0, 0.0, 0.0], 2.0).is_empty());
    }

    #[test]
    fn test_coordinate_and_parcel_means() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("func.nii.gz");
        write_gradient(&input);

        let coords = coordinate_nodes(&[[4.0, 4.0, 4.0], [0.0, 0.0, 0.0]]);
        let request = ExtractionRequest {
            input: &input,
            nodes: &coords,
            node_radius: 2.0,
            confounds: None,
            standardize: false,
        };
        let signal = NiftiSignalExtractor::new().extract(&request).unwrap();
        assert_eq!(signal.observations(), 1);
        assert_eq!(signal.nodes(), 2);
        // symmetric sphere around x=2
        assert!((signal.data()[[0, 0]] - 2.0).abs() < 1e-9);
        // corner sphere: x values 0,1,0,0
        assert!((signal.data()[[0, 1]] - 0.25).abs() < 1e-9);

        let parcel = Parcel::from_voxels(7.0, vec![[3, 0, 0], [4, 0, 0]], &grid()).unwrap();
        let parcels = NodeSet::new(
            "atlas",
            NodeLayout::Parcels(grid()),
            vec![Node {
                index: 0,
                label: "7".into(),
                geometry: NodeGeometry::Parcel(parcel),
            }],
        )
        .unwrap();
        let request = ExtractionRequest {
            nodes: &parcels,
            ..request
        };
        let signal = NiftiSignalExtractor::new().extract(&request).unwrap();
        assert!((signal.data()[[0, 0]] - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set_and_outside_node_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("func.nii.gz");
        write_gradient(&input);

        let empty = NodeSet::new("none", NodeLayout::Coordinates, Vec::new()).unwrap();
        let mut request = ExtractionRequest {
            input: &input,
            nodes: &empty,
            node_radius: 2.0,
            confounds: None,
            standardize: false,
        };
        assert!(matches!(
            NiftiSignalExtractor::new().extract(&request),
            Err(ServiceError::InvalidInput(_))
        ));

        let outside = coordinate_nodes(&[[500.0, 0.0, 0.0]]);
        request.nodes = &outside;
        assert!(matches!(
            NiftiSignalExtractor::new().extract(&request),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_confound_rows_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("func.nii.gz");
        write_gradient(&input);
        let confounds = dir.path().join("confounds.txt");
        std::fs::write(&confounds, "1.0\n2.0\n").unwrap();

        let nodes = coordinate_nodes(&[[4.0, 4.0, 4.0]]);
        let request = ExtractionRequest {
            input: &input,
            nodes: &nodes,
            node_radius: 2.0,
            confounds: Some(&confounds),
            standardize: false,
        };
        assert!(matches!(
            NiftiSignalExtractor::new().extract(&request),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
