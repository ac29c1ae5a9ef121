// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! NIfTI read/write against real files on disk

use connectometry_volume::{read_series, read_volume, write_volume, Affine, Volume, VolumeError};
use ndarray::Array3;
use tempfile::tempdir;

fn labelled_volume() -> Volume {
    let mut data = Array3::zeros((4, 5, 6));
    data[[0, 0, 0]] = 1.0;
    data[[3, 4, 5]] = 2.0;
    data[[1, 2, 3]] = 7.0;
    let affine = Affine::from_rows([
        [-2.0, 0.0, 0.0, 90.0],
        [0.0, 2.0, 0.0, -126.0],
        [0.0, 0.0, 2.0, -72.0],
    ])
    .unwrap();
    Volume::new(data, affine)
}

#[test]
fn test_compressed_volume_keeps_voxels_and_placement() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sub").join("atlas.nii.gz");
    let original = labelled_volume();

    write_volume(&path, &original).unwrap();
    let loaded = read_volume(&path).unwrap();

    assert_eq!(loaded.data().dim(), (4, 5, 6));
    assert_eq!(loaded.get([1, 2, 3]), Some(7.0));
    assert_eq!(loaded.get([3, 4, 5]), Some(2.0));
    assert_eq!(loaded.count_nonzero(), 3);
    assert_eq!(loaded.grid().world_of([1, 2, 3]), [88.0, -122.0, -66.0]);
}

#[test]
fn test_uncompressed_volume_reads_as_single_timepoint_series() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mask.nii");
    write_volume(&path, &labelled_volume()).unwrap();

    let series = read_series(&path).unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series.voxel_series([1, 2, 3]).to_vec(), vec![7.0]);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = read_volume(&dir.path().join("absent.nii.gz"));
    assert!(matches!(
        result,
        Err(VolumeError::Nifti { .. }) | Err(VolumeError::Io(_))
    ));
}
