// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Dense linear algebra used by the connectivity models and signal cleaning.

Statistics stay on `ndarray`; inverses and least squares go through
`nalgebra`.
*/

use crate::{EstimationError, EstimationResult};
use nalgebra::DMatrix;
use ndarray::{concatenate, Array1, Array2, Axis};

/// Columns with a standard deviation below this are treated as constant
pub const VARIANCE_EPSILON: f64 = 1e-12;

/// Subtract each column's mean
pub fn center_columns(data: &Array2<f64>) -> Array2<f64> {
    match data.mean_axis(Axis(0)) {
        Some(mean) => data - &mean,
        None => data.clone(),
    }
}

/// Population standard deviation of each column
pub fn column_std(data: &Array2<f64>) -> Array1<f64> {
    data.std_axis(Axis(0), 0.0)
}

/// Z-score each column (ddof 0); constant columns become zero
pub fn zscore_columns(data: &Array2<f64>) -> Array2<f64> {
    let mut centered = center_columns(data);
    let std = column_std(data);
    for (mut column, sd) in centered.columns_mut().into_iter().zip(std.iter()) {
        if *sd > VARIANCE_EPSILON {
            column.mapv_inplace(|v| v / sd);
        } else {
            column.fill(0.0);
        }
    }
    centered
}

/// Pearson correlation between columns; constant columns give zero rows and columns
pub fn pearson(data: &Array2<f64>) -> Array2<f64> {
    let n = data.nrows() as f64;
    let z = zscore_columns(data);
    z.t().dot(&z) / n
}

/// Maximum-likelihood covariance of centred columns
pub fn empirical_covariance(centered: &Array2<f64>) -> Array2<f64> {
    let n = centered.nrows() as f64;
    centered.t().dot(centered) / n
}

/// Ledoit-Wolf shrunk covariance and the shrinkage coefficient used
pub fn ledoit_wolf(data: &Array2<f64>) -> (Array2<f64>, f64) {
    let x = center_columns(data);
    let (n_samples, n_features) = x.dim();
    let emp_cov = empirical_covariance(&x);
    if n_features <= 1 {
        return (emp_cov, 0.0);
    }

    let n = n_samples as f64;
    let p = n_features as f64;
    let x2 = x.mapv(|v| v * v);
    let emp_cov_trace = x2.sum_axis(Axis(0)) / n;
    let mu = emp_cov_trace.sum() / p;

    let beta_sum = x2.t().dot(&x2).sum();
    let delta_sum = x.t().dot(&x).mapv(|v| v * v).sum() / (n * n);

    let beta = (beta_sum / n - delta_sum) / (p * n);
    let delta = (delta_sum - 2.0 * mu * emp_cov_trace.sum() + p * mu * mu) / p;
    let beta = beta.min(delta);
    let shrinkage = if beta == 0.0 { 0.0 } else { beta / delta };

    let mut shrunk = emp_cov * (1.0 - shrinkage);
    for i in 0..n_features {
        shrunk[[i, i]] += shrinkage * mu;
    }
    (shrunk, shrinkage)
}

/// Singular values at or below this fraction of the largest count as zero
pub const RANK_EPSILON: f64 = 1e-12;

fn to_dmatrix(array: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(array.nrows(), array.ncols(), |i, j| array[[i, j]])
}

fn from_dmatrix(matrix: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(matrix.shape(), |(i, j)| matrix[(i, j)])
}

/// Inverse of a square, full-rank matrix
pub fn invert(matrix: &Array2<f64>) -> EstimationResult<Array2<f64>> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(EstimationError::DimensionMismatch {
            expected: (rows, rows),
            actual: (rows, cols),
        });
    }
    if rows == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    let m = to_dmatrix(matrix);
    let singular_values = m.singular_values();
    if singular_values.min() <= RANK_EPSILON * singular_values.max() {
        return Err(EstimationError::Singular);
    }
    m.try_inverse()
        .map(|inverse| from_dmatrix(&inverse))
        .ok_or(EstimationError::Singular)
}

/// Residuals of `signals` after least-squares regression on `confounds`
/// plus an intercept
///
/// Solved by SVD, so constant or collinear confound columns are absorbed
/// rather than rejected.
pub fn regress_out(signals: &Array2<f64>, confounds: &Array2<f64>) -> EstimationResult<Array2<f64>> {
    if signals.nrows() != confounds.nrows() {
        return Err(EstimationError::DimensionMismatch {
            expected: (signals.nrows(), confounds.ncols()),
            actual: confounds.dim(),
        });
    }
    let intercept = Array2::<f64>::ones((signals.nrows(), 1));
    let design = concatenate(Axis(1), &[intercept.view(), confounds.view()])
        .map_err(|e| EstimationError::InvalidParameter(e.to_string()))?;

    let (rows, cols) = design.dim();
    let design = to_dmatrix(&design);
    let targets = to_dmatrix(signals);
    let svd = design.clone().svd(true, true);
    let cutoff = f64::EPSILON * rows.max(cols) as f64 * svd.singular_values.max();
    let beta = svd
        .solve(&targets, cutoff)
        .map_err(|e| EstimationError::InvalidParameter(e.to_string()))?;
    Ok(from_dmatrix(&(targets - design * beta)))
}

/// `(M + Mᵀ) / 2` with a zero diagonal
pub fn symmetrize_zero_diagonal(matrix: &Array2<f64>) -> Array2<f64> {
    let mut out = (matrix + &matrix.t()) / 2.0;
    out.diag_mut().fill(0.0);
    out
}

/// Copy `sub` into the rows/columns `index` of an `n × n` zero matrix
pub(crate) fn scatter(sub: &Array2<f64>, index: &[usize], n: usize) -> Array2<f64> {
    let mut out = Array2::zeros((n, n));
    for (a, &i) in index.iter().enumerate() {
        for (b, &j) in index.iter().enumerate() {
            out[[i, j]] = sub[[a, b]];
        }
    }
    out
}

/// Keep only the given columns
pub(crate) fn select_columns(data: &Array2<f64>, index: &[usize]) -> Array2<f64> {
    data.select(Axis(1), index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>, tol: f64) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{} vs {}\n{:?}\n{:?}", x, y, a, b);
        }
    }

    #[test]
    fn test_pearson_of_linear_columns() {
        let data = array![[1.0, 2.0, 5.0], [2.0, 4.0, 5.0], [3.0, 6.0, 5.0], [4.0, 8.0, 5.0]];
        let r = pearson(&data);
        assert!((r[[0, 1]] - 1.0).abs() < 1e-12);
        assert_eq!(r[[0, 2]], 0.0);
        assert_eq!(r[[2, 2]], 0.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = array![[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let inv = invert(&m).unwrap();
        assert_close(&m.dot(&inv), &Array2::eye(3), 1e-10);
    }

    #[test]
    fn test_singular_matrix() {
        let m = array![[1.0, 2.0], [2.0, 4.0]];
        assert_eq!(invert(&m), Err(EstimationError::Singular));
    }

    #[test]
    fn test_ledoit_wolf_shrinks_towards_scaled_identity() {
        let data = array![
            [1.0, 0.5, -0.3],
            [-0.2, 1.4, 0.8],
            [0.7, -1.1, 0.1],
            [-1.5, 0.2, -0.6],
            [0.0, -1.0, 0.0]
        ];
        let (shrunk, shrinkage) = ledoit_wolf(&data);
        assert!((0.0..=1.0).contains(&shrinkage));

        let emp = empirical_covariance(&center_columns(&data));
        let mu = emp.diag().sum() / 3.0;
        let expected = &emp * (1.0 - shrinkage) + &(Array2::<f64>::eye(3) * (shrinkage * mu));
        assert_close(&shrunk, &expected, 1e-12);
        assert_close(&shrunk, &shrunk.t().to_owned(), 1e-12);
    }

    #[test]
    fn test_regress_out_removes_confound() {
        let confound = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let noise = array![0.1, -0.2, 0.0, 0.2, -0.1];
        let mut signal = Array2::zeros((5, 1));
        for i in 0..5 {
            signal[[i, 0]] = 3.0 * confound[[i, 0]] + 2.0 + noise[i];
        }
        let residual = regress_out(&signal, &confound).unwrap();
        for i in 0..5 {
            assert!((residual[[i, 0]] - noise[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_regress_out_tolerates_rank_deficient_confounds() {
        let t = 50;
        let signal = Array2::from_shape_fn((t, 3), |(i, j)| {
            let x = i as f64;
            match j {
                0 => 2.0 + 3.0 * (0.1 * x).cos(),
                1 => 0.5 - (0.1 * x).cos(),
                _ => (0.7 * x).sin(),
            }
        });

        let constant =
            Array2::from_shape_fn((t, 2), |(i, j)| if j == 0 { 1.0 } else { (0.1 * i as f64).cos() });
        let duplicated = Array2::from_shape_fn((t, 2), |(i, _)| (0.1 * i as f64).cos());

        for confounds in [constant, duplicated] {
            let residual = regress_out(&signal, &confounds).unwrap();
            for i in 0..t {
                assert!(residual[[i, 0]].abs() < 1e-8);
                assert!(residual[[i, 1]].abs() < 1e-8);
            }
            let third = residual.column(2);
            assert!(third.sum().abs() < 1e-8);
            let cos: Array1<f64> = (0..t).map(|i| (0.1 * i as f64).cos()).collect();
            assert!(third.dot(&cos).abs() < 1e-8);
            assert!(third.iter().any(|v| v.abs() > 0.1));
        }
    }
}
