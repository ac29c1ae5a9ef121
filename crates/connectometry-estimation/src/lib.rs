// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Connectometry Estimation

Node-by-node connectivity from a signal matrix:

- **Models**: correlation, partial correlation, Ledoit-Wolf covariance, precision
- **Thresholding**: fixed proportional, density target, adaptive (structural informed)
- **Normalization**: absolute weights scaled into `[0, 1]`

```no_run
use connectometry_estimation::{ConnectivityEstimator, ConnectivityModel, SignalMatrix,
    ThresholdConfig, ThresholdSettings};
# fn demo(signal: SignalMatrix) -> connectometry_estimation::EstimationResult<()> {
let estimator = ConnectivityEstimator::new(
    ConnectivityModel::Corr,
    ThresholdConfig::new(0.5, None, false)?,
    ThresholdSettings::default(),
)?;
let result = estimator.estimate(&signal, None)?;
assert_eq!(result.edge_threshold, "50.0%");
# Ok(())
# }
```
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod estimator;
pub mod linalg;
pub mod model;
pub mod signal;
pub mod threshold;
pub mod types;

pub use estimator::{ConnectivityEstimator, Thresholded};
pub use model::ConnectivityModel;
pub use signal::SignalMatrix;
pub use threshold::{
    adaptive_search, binarize, density, density_search, edge_threshold, normalize, python_float,
    threshold_absolute, threshold_proportional, ThresholdConfig, ThresholdPolicy,
    ThresholdSettings,
};
pub use types::{EstimationError, EstimationResult};
