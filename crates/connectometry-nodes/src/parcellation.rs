// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Splitting a label volume into parcels.

use crate::Parcel;
use ahash::AHashMap;
use connectometry_volume::Volume;

/// One parcel per distinct non-zero value, in ascending value order.
/// Background (0) and non-finite values are skipped.
pub fn split_parcels(volume: &Volume) -> Vec<Parcel> {
    let grid = volume.grid();
    let mut groups: AHashMap<u32, Vec<[usize; 3]>> = AHashMap::new();

    for ((i, j, k), value) in volume.data().indexed_iter() {
        if *value == 0.0 || !value.is_finite() {
            continue;
        }
        groups.entry(value.to_bits()).or_default().push([i, j, k]);
    }

    let mut values: Vec<f32> = groups.keys().map(|bits| f32::from_bits(*bits)).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    values
        .into_iter()
        .filter_map(|value| {
            let voxels = groups.remove(&value.to_bits())?;
            Parcel::from_voxels(value, voxels, &grid)
        })
        .collect()
}
