// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
In-memory 3-D volumes and 4-D series.
*/

use crate::{Affine, VoxelGrid, VoxelIndex, WorldCoordinate};
use ndarray::{Array3, Array4, ArrayView1, Axis};

/// 3-D scalar volume (atlas labels, masks, templates)
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<f32>,
    affine: Affine,
}

impl Volume {
    pub fn new(data: Array3<f32>, affine: Affine) -> Self {
        Self { data, affine }
    }

    /// All-zero volume on the given grid
    pub fn zeros(grid: &VoxelGrid) -> Self {
        Self::new(Array3::zeros(grid.shape), grid.affine)
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array3<f32> {
        &mut self.data
    }

    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    pub fn grid(&self) -> VoxelGrid {
        let (x, y, z) = self.data.dim();
        VoxelGrid::new([x, y, z], self.affine)
    }

    pub fn get(&self, index: VoxelIndex) -> Option<f32> {
        self.data.get((index[0], index[1], index[2])).copied()
    }

    /// Value of the voxel nearest to a world coordinate
    pub fn value_at_world(&self, world: WorldCoordinate) -> Option<f32> {
        self.grid()
            .nearest_voxel(world)
            .and_then(|index| self.get(index))
    }

    /// True when the world coordinate falls on a non-zero voxel
    pub fn is_nonzero_at(&self, world: WorldCoordinate) -> bool {
        self.value_at_world(world).map_or(false, |v| v != 0.0)
    }

    /// Number of non-zero voxels
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| **v != 0.0).count()
    }
}

/// 4-D series (x, y, z, t), e.g. a functional run
#[derive(Debug, Clone)]
pub struct SeriesVolume {
    data: Array4<f32>,
    affine: Affine,
}

impl SeriesVolume {
    pub fn new(data: Array4<f32>, affine: Affine) -> Self {
        Self { data, affine }
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    pub fn grid(&self) -> VoxelGrid {
        let (x, y, z, _) = self.data.dim();
        VoxelGrid::new([x, y, z], self.affine)
    }

    /// Number of time points
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time course of a single voxel
    pub fn voxel_series(&self, index: VoxelIndex) -> ArrayView1<'_, f32> {
        self.data
            .index_axis(Axis(0), index[0])
            .index_axis_move(Axis(0), index[1])
            .index_axis_move(Axis(0), index[2])
    }
}
