// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
NIfTI-1 reading and writing.

The affine is the header's sform when present, otherwise its qform
quaternion, otherwise `pixdim` spacing alone.
*/

use crate::{Affine, SeriesVolume, Volume, VolumeError, VolumeResult};
use nalgebra::Matrix4;
use ndarray::{Array3, Array4, ArrayD, IxDyn};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;
use tracing::debug;

/// True for `.nii` and `.nii.gz` paths
pub fn is_volume_path(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    name.ends_with(".nii") || name.ends_with(".nii.gz")
}

fn nifti_error(path: &Path, err: impl std::fmt::Display) -> VolumeError {
    VolumeError::Nifti {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn read_raw(path: &Path) -> VolumeResult<(NiftiHeader, ArrayD<f32>)> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| nifti_error(path, e))?;
    let header = obj.header().clone();
    let raw = obj
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|e| nifti_error(path, e))?;

    // nifti hands back its own ndarray version; copy across in logical order
    let shape = raw.shape().to_vec();
    let values: Vec<f32> = raw.iter().copied().collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| VolumeError::ShapeMismatch(e.to_string()))?;

    debug!(path = %path.display(), ?shape, "Loaded NIfTI volume");
    Ok((header, data))
}

fn unsupported(path: &Path, shape: &[usize]) -> VolumeError {
    VolumeError::UnsupportedShape {
        path: path.display().to_string(),
        shape: shape.to_vec(),
    }
}

/// Read a 3-D volume; a 4-D file with a single volume is accepted too
pub fn read_volume(path: &Path) -> VolumeResult<Volume> {
    let (header, data) = read_raw(path)?;
    let shape = data.shape().to_vec();
    let data = match shape.as_slice() {
        [_, _, _] => data,
        [x, y, z, 1] => data
            .into_shape_with_order(IxDyn(&[*x, *y, *z]))
            .map_err(|e| VolumeError::ShapeMismatch(e.to_string()))?,
        _ => return Err(unsupported(path, &shape)),
    };
    let data: Array3<f32> = data
        .into_dimensionality()
        .map_err(|e| VolumeError::ShapeMismatch(e.to_string()))?;
    Ok(Volume::new(data, header_affine(&header)?))
}

/// Read a 4-D series; a 3-D file is treated as a single time point
pub fn read_series(path: &Path) -> VolumeResult<SeriesVolume> {
    let (header, data) = read_raw(path)?;
    let shape = data.shape().to_vec();
    let data = match shape.as_slice() {
        [_, _, _, _] => data,
        [x, y, z] => data
            .into_shape_with_order(IxDyn(&[*x, *y, *z, 1]))
            .map_err(|e| VolumeError::ShapeMismatch(e.to_string()))?,
        _ => return Err(unsupported(path, &shape)),
    };
    let data: Array4<f32> = data
        .into_dimensionality()
        .map_err(|e| VolumeError::ShapeMismatch(e.to_string()))?;
    Ok(SeriesVolume::new(data, header_affine(&header)?))
}

/// Write a 3-D volume; `.nii.gz` paths are gzip-compressed
pub fn write_volume(path: &Path, volume: &Volume) -> VolumeResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let (x, y, z) = volume.data().dim();
    let values: Vec<f32> = volume.data().iter().copied().collect();
    let array = nifti_ndarray::Array3::from_shape_vec((x, y, z), values)
        .map_err(|e| VolumeError::ShapeMismatch(e.to_string()))?;

    let header = header_for(volume);
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .map_err(|e| nifti_error(path, e))?;

    debug!(path = %path.display(), shape = ?(x, y, z), "Wrote NIfTI volume");
    Ok(())
}

fn header_for(volume: &Volume) -> NiftiHeader {
    let grid = volume.grid();
    let rows = volume.affine().rows();
    let size = volume.affine().voxel_size();
    let to_f32 = |row: &[f64; 4]| [row[0] as f32, row[1] as f32, row[2] as f32, row[3] as f32];

    NiftiHeader {
        dim: [
            3,
            grid.shape[0] as u16,
            grid.shape[1] as u16,
            grid.shape[2] as u16,
            1,
            1,
            1,
            1,
        ],
        pixdim: [1.0, size[0] as f32, size[1] as f32, size[2] as f32, 1.0, 1.0, 1.0, 1.0],
        sform_code: 1,
        qform_code: 0,
        srow_x: to_f32(&rows[0]),
        srow_y: to_f32(&rows[1]),
        srow_z: to_f32(&rows[2]),
        ..NiftiHeader::default()
    }
}

fn header_affine(header: &NiftiHeader) -> VolumeResult<Affine> {
    if header.sform_code > 0 || header.qform_code > 0 {
        // sform first, then the qform quaternion
        let matrix = header.affine::<f64>();
        return Affine::from_matrix(Matrix4::from_iterator(matrix.iter().copied()));
    }

    let spacing = [
        positive_or_one(header.pixdim[1]),
        positive_or_one(header.pixdim[2]),
        positive_or_one(header.pixdim[3]),
    ];
    Affine::scaled(spacing, [0.0; 3])
}

fn positive_or_one(value: f32) -> f64 {
    if value > 0.0 {
        value as f64
    } else {
        1.0
    }
}
