// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectivity models.

| id | model |
|---|---|
| `corr` | Pearson correlation |
| `partcorr` | partial correlation from the shrunk precision matrix |
| `cov` | Ledoit-Wolf shrunk covariance |
| `prec` | inverse of the shrunk covariance |

Every fit returns a symmetric node-by-node matrix with a zero diagonal.
Constant columns contribute zero rows and columns.
*/

use crate::linalg::{
    column_std, invert, ledoit_wolf, pearson, scatter, select_columns, symmetrize_zero_diagonal,
    VARIANCE_EPSILON,
};
use crate::{EstimationError, EstimationResult, SignalMatrix};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityModel {
    Corr,
    PartCorr,
    Cov,
    Prec,
}

impl ConnectivityModel {
    pub const ALL: [ConnectivityModel; 4] = [
        ConnectivityModel::Corr,
        ConnectivityModel::PartCorr,
        ConnectivityModel::Cov,
        ConnectivityModel::Prec,
    ];

    /// Identifier used on the command line and in file names
    pub fn id(&self) -> &'static str {
        match self {
            ConnectivityModel::Corr => "corr",
            ConnectivityModel::PartCorr => "partcorr",
            ConnectivityModel::Cov => "cov",
            ConnectivityModel::Prec => "prec",
        }
    }

    /// Fit the model to `signal` (observations × nodes)
    pub fn fit(&self, signal: &SignalMatrix) -> EstimationResult<Array2<f64>> {
        let (observations, nodes) = signal.data().dim();
        if observations < 2 || nodes < 2 {
            return Err(EstimationError::Degenerate(format!(
                "need at least 2 observations and 2 nodes, got {} × {}",
                observations, nodes
            )));
        }
        if signal.data().iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::Degenerate(
                "signal contains non-finite values".to_string(),
            ));
        }

        let fitted = match self {
            ConnectivityModel::Corr => pearson(signal.data()),
            _ => self.fit_shrunk(signal.data())?,
        };
        debug!(model = self.id(), nodes, observations, "Fitted connectivity model");
        Ok(symmetrize_zero_diagonal(&fitted))
    }

    fn fit_shrunk(&self, data: &Array2<f64>) -> EstimationResult<Array2<f64>> {
        let n = data.ncols();
        let active: Vec<usize> = column_std(data)
            .iter()
            .enumerate()
            .filter(|(_, sd)| **sd > VARIANCE_EPSILON)
            .map(|(i, _)| i)
            .collect();
        if active.len() < n {
            warn!(
                constant = n - active.len(),
                "Constant node signals get zero connectivity"
            );
        }
        if active.is_empty() {
            return Ok(Array2::zeros((n, n)));
        }

        let (covariance, shrinkage) = ledoit_wolf(&select_columns(data, &active));
        debug!(shrinkage, "Ledoit-Wolf covariance");

        let sub = match self {
            ConnectivityModel::Prec => invert(&covariance)?,
            ConnectivityModel::PartCorr => partial_correlation(&invert(&covariance)?),
            _ => covariance,
        };
        Ok(scatter(&sub, &active, n))
    }
}

/// `-P_ij / sqrt(P_ii P_jj)` off the diagonal
fn partial_correlation(precision: &Array2<f64>) -> Array2<f64> {
    let d = precision.diag().mapv(|v| v.abs().sqrt());
    let mut out = Array2::zeros(precision.dim());
    for ((i, j), p) in precision.indexed_iter() {
        if i != j && d[i] > 0.0 && d[j] > 0.0 {
            out[[i, j]] = -p / (d[i] * d[j]);
        }
    }
    out
}

impl fmt::Display for ConnectivityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ConnectivityModel {
    type Err = EstimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectivityModel::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| EstimationError::UnknownModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn signal() -> SignalMatrix {
        SignalMatrix::new(array![
            [0.1, 1.0, -0.5, 2.0],
            [0.4, 0.8, -0.1, 2.0],
            [-0.3, 1.3, 0.6, 2.0],
            [0.9, -0.2, 0.2, 2.0],
            [-0.6, 0.1, -0.4, 2.0],
            [0.2, -0.9, 0.3, 2.0]
        ])
    }

    #[test]
    fn test_model_ids() {
        for model in ConnectivityModel::ALL {
            assert_eq!(model.id().parse::<ConnectivityModel>().unwrap(), model);
        }
        assert!(matches!(
            "sps".parse::<ConnectivityModel>(),
            Err(EstimationError::UnknownModel(_))
        ));
        assert_eq!(serde_json::to_string(&ConnectivityModel::PartCorr).unwrap(), "\"partcorr\"");
    }

    #[test]
    fn test_every_model_is_symmetric_with_zero_diagonal() {
        let signal = signal();
        for model in ConnectivityModel::ALL {
            let m = model.fit(&signal).unwrap();
            assert_eq!(m.dim(), (4, 4));
            for i in 0..4 {
                assert_eq!(m[[i, i]], 0.0, "{} diagonal", model);
                // constant node
                assert_eq!(m[[i, 3]], 0.0, "{} constant column", model);
                for j in 0..4 {
                    assert!((m[[i, j]] - m[[j, i]]).abs() < 1e-12);
                    assert!(m[[i, j]].is_finite());
                }
            }
        }
    }

    #[test]
    fn test_correlation_bounds() {
        let m = ConnectivityModel::Corr.fit(&signal()).unwrap();
        assert!(m.iter().all(|v| v.abs() <= 1.0 + 1e-12));
    }

    #[test]
    fn test_degenerate_inputs() {
        let one_row = SignalMatrix::new(array![[1.0, 2.0, 3.0]]);
        let one_node = SignalMatrix::new(array![[1.0], [2.0], [3.0]]);
        let empty = SignalMatrix::new(Array2::zeros((10, 0)));
        for signal in [one_row, one_node, empty] {
            assert!(matches!(
                ConnectivityModel::Corr.fit(&signal),
                Err(EstimationError::Degenerate(_))
            ));
        }
    }
}
