// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Output file naming.

Every artifact of a run lives in the run's output directory and is named from
the subject ID, the optional network and the optional mask name:

| artifact | name |
|---|---|
| parcel volume | `<ID>[_<net>]_parcels[_masked_<mask>].nii.gz` |
| node coordinates | `<ID>[_<net>]_coords[_<mask>].json` |
| node labels | `<ID>[_<net>]_labelnames[_<mask>].json` |
| time series | `<stem>_net_ts.txt` |
| structural estimate | `<ID>[_<net>]_structural_est.txt` |
| final estimate | `<stem>_est_<model>_<tag>.txt` |
| plots | `<stem>_connectogram_<model>.json` (`struct` for structural graphs), `<stem>_adj_mat_<model>.png`, `<stem>_ts_plot.png`, `<stem>_connectome_viz.png` |
| region volumes | `<ID>[_<net>]_volumes/region_<k>.nii.gz` |

with `<stem> = <ID>[_<net>][_<mask>]`.
*/

use connectometry_estimation::{ConnectivityModel, ThresholdPolicy};
use connectometry_nodes::{mask_name, Network};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    dir: PathBuf,
    subject: String,
    network: Option<Network>,
    mask: Option<String>,
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>, subject: &str, network: Option<Network>, mask: Option<&Path>) -> Self {
        Self {
            dir: dir.into(),
            subject: subject.to_string(),
            network,
            mask: mask.map(mask_name),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mask_name(&self) -> Option<&str> {
        self.mask.as_deref()
    }

    /// `<ID>[_<net>]`
    fn base(&self) -> String {
        match &self.network {
            Some(net) => format!("{}_{}", self.subject, net),
            None => self.subject.clone(),
        }
    }

    /// `<ID>[_<net>][_<mask>]`
    pub fn stem(&self) -> String {
        match &self.mask {
            Some(mask) => format!("{}_{}", self.base(), mask),
            None => self.base(),
        }
    }

    fn mask_suffix(&self) -> String {
        self.mask
            .as_ref()
            .map(|m| format!("_{}", m))
            .unwrap_or_default()
    }

    fn file(&self, name: String) -> PathBuf {
        self.dir.join(name)
    }

    pub fn parcels(&self) -> PathBuf {
        match &self.mask {
            Some(mask) => self.file(format!("{}_parcels_masked_{}.nii.gz", self.base(), mask)),
            None => self.file(format!("{}_parcels.nii.gz", self.base())),
        }
    }

    pub fn coords(&self) -> PathBuf {
        self.file(format!("{}_coords{}.json", self.base(), self.mask_suffix()))
    }

    pub fn labels(&self) -> PathBuf {
        self.file(format!("{}_labelnames{}.json", self.base(), self.mask_suffix()))
    }

    pub fn timeseries(&self) -> PathBuf {
        self.file(format!("{}_net_ts.txt", self.stem()))
    }

    /// Written by structural runs, read by adaptive thresholding
    pub fn structural_estimate(&self) -> PathBuf {
        self.file(format!("{}_structural_est.txt", self.base()))
    }

    pub fn estimate(&self, model: ConnectivityModel, policy: &ThresholdPolicy) -> PathBuf {
        self.file(format!("{}_est_{}_{}.txt", self.stem(), model.id(), policy.tag()))
    }

    /// `model` is `None` for structural graphs
    pub fn connectogram(&self, model: Option<ConnectivityModel>) -> PathBuf {
        self.file(format!("{}_connectogram_{}.json", self.stem(), model_tag(model)))
    }

    pub fn adjacency_plot(&self, model: Option<ConnectivityModel>) -> PathBuf {
        self.file(format!("{}_adj_mat_{}.png", self.stem(), model_tag(model)))
    }

    pub fn timeseries_plot(&self) -> PathBuf {
        self.file(format!("{}_ts_plot.png", self.stem()))
    }

    pub fn connectome_plot(&self) -> PathBuf {
        self.file(format!("{}_connectome_viz.png", self.stem()))
    }

    pub fn region_volumes_dir(&self) -> PathBuf {
        self.file(format!("{}_volumes", self.base()))
    }

    /// `k` counts from 1, matching the relabelled parcel volume
    pub fn region_volume(&self, k: usize) -> PathBuf {
        self.region_volumes_dir().join(format!("region_{}.nii.gz", k))
    }
}

fn model_tag(model: Option<ConnectivityModel>) -> &'static str {
    model.map_or("struct", |m| m.id())
}
