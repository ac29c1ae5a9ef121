// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Voxel-to-world affine transforms and voxel grids.
*/

use crate::{VolumeError, VolumeResult};
use nalgebra::{Matrix4, Point3};

/// World-space position in millimetres (x, y, z)
pub type WorldCoordinate = [f64; 3];

/// Integer voxel position (i, j, k)
pub type VoxelIndex = [usize; 3];

/// Determinants below this make the voxel axes degenerate
const DETERMINANT_EPSILON: f64 = 1e-12;

/// Voxel-to-world transform (homogeneous 4x4) together with its inverse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    matrix: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl Affine {
    /// Build from a homogeneous voxel-to-world matrix
    pub fn from_matrix(matrix: Matrix4<f64>) -> VolumeResult<Self> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(VolumeError::SingularAffine);
        }
        let det = matrix.fixed_view::<3, 3>(0, 0).determinant();
        if det.abs() < DETERMINANT_EPSILON {
            return Err(VolumeError::SingularAffine);
        }
        let inverse = matrix.try_inverse().ok_or(VolumeError::SingularAffine)?;
        Ok(Self { matrix, inverse })
    }

    /// Build from the three rows `[r0, r1, r2, t]` of the 4x4 matrix
    pub fn from_rows(rows: [[f64; 4]; 3]) -> VolumeResult<Self> {
        let mut matrix = Matrix4::identity();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                matrix[(r, c)] = *value;
            }
        }
        Self::from_matrix(matrix)
    }

    /// Axis-aligned transform with the given voxel spacing and origin
    pub fn scaled(spacing: [f64; 3], origin: WorldCoordinate) -> VolumeResult<Self> {
        Self::from_rows([
            [spacing[0], 0.0, 0.0, origin[0]],
            [0.0, spacing[1], 0.0, origin[1]],
            [0.0, 0.0, spacing[2], origin[2]],
        ])
    }

    /// 1 mm isotropic grid with the origin at voxel (0, 0, 0)
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Top three rows of the matrix, as stored in a NIfTI sform
    pub fn rows(&self) -> [[f64; 4]; 3] {
        let mut rows = [[0.0; 4]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.matrix[(r, c)];
            }
        }
        rows
    }

    /// Map a (possibly fractional) voxel position to world space
    pub fn voxel_to_world(&self, voxel: [f64; 3]) -> WorldCoordinate {
        apply(&self.matrix, voxel)
    }

    /// Map a world position to fractional voxel space
    pub fn world_to_voxel(&self, world: WorldCoordinate) -> [f64; 3] {
        apply(&self.inverse, world)
    }

    /// Edge lengths of one voxel in millimetres
    pub fn voxel_size(&self) -> [f64; 3] {
        let mut size = [0.0; 3];
        for (axis, value) in size.iter_mut().enumerate() {
            *value = self.matrix.fixed_view::<3, 1>(0, axis).norm();
        }
        size
    }
}

fn apply(m: &Matrix4<f64>, p: [f64; 3]) -> [f64; 3] {
    let out = m.transform_point(&Point3::new(p[0], p[1], p[2]));
    [out.x, out.y, out.z]
}

/// Shape of a 3-D voxel array plus its placement in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelGrid {
    pub shape: [usize; 3],
    pub affine: Affine,
}

impl VoxelGrid {
    pub fn new(shape: [usize; 3], affine: Affine) -> Self {
        Self { shape, affine }
    }

    pub fn voxel_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn contains(&self, index: VoxelIndex) -> bool {
        index.iter().zip(self.shape.iter()).all(|(i, n)| i < n)
    }

    /// Nearest voxel to a world coordinate, `None` outside the grid
    pub fn nearest_voxel(&self, world: WorldCoordinate) -> Option<VoxelIndex> {
        let fractional = self.affine.world_to_voxel(world);
        let mut index = [0usize; 3];
        for axis in 0..3 {
            let rounded = fractional[axis].round();
            if !rounded.is_finite() || rounded < 0.0 || rounded >= self.shape[axis] as f64 {
                return None;
            }
            index[axis] = rounded as usize;
        }
        Some(index)
    }

    pub fn world_of(&self, index: VoxelIndex) -> WorldCoordinate {
        self.affine
            .voxel_to_world([index[0] as f64, index[1] as f64, index[2] as f64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_inverse() {
        let affine = Affine::from_rows([
            [-2.0, 0.0, 0.0, 90.0],
            [0.0, 2.0, 0.0, -126.0],
            [0.0, 0.0, 2.0, -72.0],
        ])
        .unwrap();

        let world = affine.voxel_to_world([10.0, 20.0, 30.0]);
        assert_eq!(world, [70.0, -86.0, -12.0]);

        let voxel = affine.world_to_voxel(world);
        for (got, want) in voxel.iter().zip([10.0, 20.0, 30.0]) {
            assert!((got - want).abs() < 1e-9);
        }
        assert_eq!(affine.voxel_size(), [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_singular_affine_is_rejected() {
        let result = Affine::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ]);
        assert!(matches!(result, Err(VolumeError::SingularAffine)));
    }

    #[test]
    fn test_oblique_affine_inverts() {
        let affine = Affine::from_rows([
            [0.0, -2.0, 0.0, 10.0],
            [1.5, 0.0, 0.0, -4.0],
            [0.0, 0.3, 2.5, 7.0],
        ])
        .unwrap();

        let voxel = [3.0, 4.5, 1.25];
        let back = affine.world_to_voxel(affine.voxel_to_world(voxel));
        for (got, want) in back.iter().zip(voxel) {
            assert!((got - want).abs() < 1e-9);
        }
        assert_eq!(affine.rows()[1], [1.5, 0.0, 0.0, -4.0]);
    }

    #[test]
    fn test_nearest_voxel_bounds() {
        let grid = VoxelGrid::new([4, 4, 4], Affine::scaled([2.0; 3], [0.0; 3]).unwrap());
        assert_eq!(grid.nearest_voxel([2.9, 0.0, 6.0]), Some([1, 0, 3]));
        assert_eq!(grid.nearest_voxel([-1.5, 0.0, 0.0]), None);
        assert_eq!(grid.nearest_voxel([0.0, 7.1, 0.0]), None);
    }
}
