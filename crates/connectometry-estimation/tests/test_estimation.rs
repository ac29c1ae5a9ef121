// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Estimation Integration Tests

End-to-end fit → threshold → normalize:
- each policy produces a finalized matrix
- normalization postconditions hold for arbitrary inputs (property tests)
- degenerate inputs fail cleanly
*/

use connectometry_estimation::{
    density, edge_threshold, normalize, ConnectivityEstimator, ConnectivityModel, EstimationError,
    SignalMatrix, ThresholdConfig, ThresholdPolicy, ThresholdSettings,
};
use ndarray::Array2;
use proptest::prelude::*;

/// Deterministic pseudo-random signal (observations × nodes)
fn synthetic_signal(observations: usize, nodes: usize) -> SignalMatrix {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let data = Array2::from_shape_fn((observations, nodes), |(t, j)| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let noise = (state % 10_000) as f64 / 10_000.0 - 0.5;
        ((t as f64) * 0.3 + j as f64).sin() + noise
    });
    SignalMatrix::new(data)
}

fn estimator(model: ConnectivityModel, config: ThresholdConfig) -> ConnectivityEstimator {
    ConnectivityEstimator::new(model, config, ThresholdSettings::default()).unwrap()
}

fn assert_finalized(matrix: &Array2<f64>) {
    let n = matrix.nrows();
    for i in 0..n {
        assert_eq!(matrix[[i, i]], 0.0);
        for j in 0..n {
            assert!((0.0..=1.0 + 1e-12).contains(&matrix[[i, j]]));
            assert_eq!(matrix[[i, j]], matrix[[j, i]]);
        }
    }
}

#[test]
fn test_proportional_half_of_edges_retained() {
    let signal = synthetic_signal(120, 8);
    let config = ThresholdConfig::new(0.5, None, false).unwrap();

    let result = estimator(ConnectivityModel::Corr, config)
        .estimate(&signal, None)
        .unwrap();

    assert_eq!(result.policy, ThresholdPolicy::Proportional(0.5));
    assert_eq!(result.edge_threshold, "50.0%");
    assert_eq!(result.effective_threshold, 0.5);
    // 28 possible edges, 14 kept
    assert_eq!(density(&result.matrix), 0.5);
    assert_finalized(&result.matrix);
}

#[test]
fn test_every_model_finalizes() {
    let signal = synthetic_signal(60, 6);
    let config = ThresholdConfig::new(0.4, None, false).unwrap();
    for model in ConnectivityModel::ALL {
        let result = estimator(model, config).estimate(&signal, None).unwrap();
        assert_finalized(&result.matrix);
        assert!(result.matrix.iter().any(|v| *v == 1.0), "{} has no maximum", model);
    }
}

#[test]
fn test_density_policy_reaches_target() {
    let signal = synthetic_signal(80, 10);
    let config = ThresholdConfig::new(1.0, Some(0.3), false).unwrap();

    let result = estimator(ConnectivityModel::PartCorr, config)
        .estimate(&signal, None)
        .unwrap();

    assert_eq!(result.policy, ThresholdPolicy::Density(0.3));
    assert!(density(&result.matrix) <= 0.3 || result.effective_threshold > 0.5);
    assert_eq!(result.edge_threshold, edge_threshold(result.effective_threshold));
    assert_finalized(&result.matrix);
}

#[test]
fn test_adaptive_policy_needs_structural_matrix() {
    let signal = synthetic_signal(50, 5);
    let config = ThresholdConfig::new(0.5, Some(0.2), true).unwrap();
    let estimator = estimator(ConnectivityModel::Corr, config);

    assert!(matches!(
        estimator.estimate(&signal, None),
        Err(EstimationError::InvalidParameter(_))
    ));

    let structural = Array2::from_elem((5, 5), 1.0);
    let result = estimator.estimate(&signal, Some(&structural)).unwrap();
    assert_eq!(result.policy, ThresholdPolicy::Adaptive);
    // a complete structural graph is matched by keeping every edge
    assert_eq!(density(&result.matrix), 1.0);
    assert!(result.effective_threshold >= 0.95);
    assert_finalized(&result.matrix);
}

#[test]
fn test_empty_node_set_is_degenerate() {
    let signal = SignalMatrix::new(Array2::zeros((100, 0)));
    let config = ThresholdConfig::new(0.5, None, false).unwrap();
    assert!(matches!(
        estimator(ConnectivityModel::Corr, config).estimate(&signal, None),
        Err(EstimationError::Degenerate(_))
    ));
}

proptest! {
    #[test]
    fn prop_normalize_postconditions(values in prop::collection::vec(-50.0f64..50.0, 36)) {
        let raw = Array2::from_shape_vec((6, 6), values).unwrap();
        let symmetric = &raw + &raw.t();
        let out = normalize(&symmetric);

        let max = out.iter().fold(0.0f64, |m, v| m.max(*v));
        prop_assert!(max <= 1.0 + 1e-12);
        for i in 0..6 {
            prop_assert_eq!(out[[i, i]], 0.0);
            for j in 0..6 {
                prop_assert!(out[[i, j]] >= 0.0);
                prop_assert_eq!(out[[i, j]], out[[j, i]]);
            }
        }
    }

    #[test]
    fn prop_single_policy_selected(thr in 0.0f64..=1.0, dens in prop::option::of(0.01f64..=1.0), adapt in any::<bool>()) {
        let config = ThresholdConfig::new(thr, dens, adapt).unwrap();
        let expected = match (adapt, dens) {
            (true, _) => ThresholdPolicy::Adaptive,
            (false, Some(d)) => ThresholdPolicy::Density(d),
            (false, None) => ThresholdPolicy::Proportional(thr),
        };
        prop_assert_eq!(config.policy(), expected);
    }
}
