// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Artifact persistence for one run.

Every file goes to the location [`OutputPaths`] gives it. Rendering is best
effort: failures are logged and never returned.
*/

use crate::paths::OutputPaths;
use crate::traits::Renderer;
use crate::types::*;
use connectometry_estimation::{ConnectivityModel, SignalMatrix, ThresholdPolicy};
use connectometry_nodes::{Network, NodeSet};
use connectometry_volume::{write_matrix, write_volume};
use ndarray::Array2;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What the renderer is asked to draw for a finished graph
#[derive(Debug, Clone, Copy)]
pub struct GraphArtifacts<'a> {
    pub matrix: &'a Array2<f64>,
    pub nodes: &'a NodeSet,
    /// `None` for structural graphs
    pub model: Option<ConnectivityModel>,
    pub edge_threshold: &'a str,
    /// Time series, drawn for per-network runs only
    pub signal: Option<&'a SignalMatrix>,
}

pub struct ArtifactWriter<'a> {
    paths: &'a OutputPaths,
    network: Option<Network>,
    renderer: Option<&'a dyn Renderer>,
    plotting: PlotSettings,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new(paths: &'a OutputPaths, network: Option<Network>, plotting: PlotSettings) -> Self {
        Self {
            paths,
            network,
            renderer: None,
            plotting,
        }
    }

    /// Enable plotting through `renderer`
    pub fn with_renderer(mut self, renderer: &'a dyn Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn paths(&self) -> &OutputPaths {
        self.paths
    }

    /// Coordinates (parcel centroids for parcels) and label names as JSON
    pub fn write_node_lists(&self, nodes: &NodeSet) -> PipelineResult<(PathBuf, PathBuf)> {
        let coords_path = self.paths.coords();
        let labels_path = self.paths.labels();
        write_json(&coords_path, &nodes.coordinates())?;
        write_json(&labels_path, &nodes.labels())?;
        info!(
            "Saved {} node coordinates and labels to {}",
            nodes.len(),
            self.paths.dir().display()
        );
        Ok((coords_path, labels_path))
    }

    /// Combined label volume, `None` for coordinate node sets
    pub fn write_parcels(&self, nodes: &NodeSet) -> PipelineResult<Option<PathBuf>> {
        let Some(volume) = nodes.label_volume() else {
            return Ok(None);
        };
        let path = self.paths.parcels();
        write_volume(&path, &volume)?;
        Ok(Some(path))
    }

    /// One binary volume per parcel, numbered from 1 in node order
    pub fn write_region_volumes(&self, nodes: &NodeSet) -> PipelineResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (k, volume) in nodes.parcel_volumes().iter().enumerate() {
            let path = self.paths.region_volume(k + 1);
            write_volume(&path, volume)?;
            written.push(path);
        }
        Ok(written)
    }

    pub fn write_timeseries(&self, signal: &SignalMatrix) -> PipelineResult<PathBuf> {
        let path = self.paths.timeseries();
        write_matrix(&path, signal.data())?;
        Ok(path)
    }

    pub fn write_estimate(
        &self,
        matrix: &Array2<f64>,
        model: ConnectivityModel,
        policy: &ThresholdPolicy,
    ) -> PipelineResult<PathBuf> {
        let path = self.paths.estimate(model, policy);
        write_matrix(&path, matrix)?;
        info!("Saved connectivity estimate to {}", path.display());
        Ok(path)
    }

    pub fn title(&self) -> String {
        match self.network {
            Some(network) => format!("Connectivity Projected on the {}", network),
            None => "Connectivity Projected on the Whole Brain".to_string(),
        }
    }

    /// Render every plot for a finished graph; returns the files written
    pub fn render(&self, graph: &GraphArtifacts<'_>) -> Vec<PathBuf> {
        let Some(renderer) = self.renderer else {
            return Vec::new();
        };
        let labels = graph.nodes.labels();
        let coordinates = graph.nodes.coordinates();
        let title = self.title();
        let plot = GraphPlot {
            matrix: graph.matrix,
            labels: &labels,
            coordinates: &coordinates,
            title: &title,
            model: graph.model,
            edge_threshold: graph.edge_threshold,
        };

        let mut written = Vec::new();
        let mut keep = |what: &str, result: RenderResult<PathBuf>| match result {
            Ok(path) => written.push(path),
            Err(e) => error!("Failed to render {}: {}", what, e),
        };

        if graph.nodes.len() >= self.plotting.min_connectogram_nodes {
            keep(
                "connectogram",
                renderer.connectogram(&plot, &self.paths.connectogram(graph.model)),
            );
        } else {
            warn!(
                "Cannot plot connectogram for graphs smaller than {} x {}!",
                self.plotting.min_connectogram_nodes,
                self.plotting.min_connectogram_nodes
            );
        }

        keep(
            "adjacency matrix",
            renderer.adjacency_matrix(&plot, &self.paths.adjacency_plot(graph.model)),
        );

        if let (Some(_), Some(signal)) = (self.network, graph.signal) {
            keep(
                "time series",
                renderer.timeseries(signal, &labels, &title, &self.paths.timeseries_plot()),
            );
        }

        keep(
            "connectome",
            renderer.connectome(&plot, &self.paths.connectome_plot()),
        );
        written
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectometry_nodes::{Node, NodeGeometry, NodeLayout};
    use std::sync::Mutex;

    /// Records which plots were requested
    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRenderer {
        fn record(&self, what: &str, output: &Path) -> RenderResult<PathBuf> {
            self.calls.lock().unwrap().push(what.to_string());
            Ok(output.to_path_buf())
        }
    }

    impl Renderer for RecordingRenderer {
        fn connectogram(&self, _: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf> {
            self.record("connectogram", output)
        }
        fn adjacency_matrix(&self, _: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf> {
            self.record("adjacency", output)
        }
        fn timeseries(&self, _: &SignalMatrix, _: &[String], _: &str, output: &Path) -> RenderResult<PathBuf> {
            self.record("timeseries", output)
        }
        fn connectome(&self, _: &GraphPlot<'_>, _: &Path) -> RenderResult<PathBuf> {
            Err(RenderError::InvalidInput("no brain outline".into()))
        }
    }

    fn coordinate_set(n: usize) -> NodeSet {
        let nodes = (0..n)
            .map(|index| Node {
                index,
                label: format!("n{}", index),
                geometry: NodeGeometry::Coordinate([index as f64, 0.0, 0.0]),
            })
            .collect();
        NodeSet::new("coords_power_2011", NodeLayout::Coordinates, nodes).unwrap()
    }

    #[test]
    fn test_small_graph_skips_connectogram_and_swallows_failures() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "997", Some(Network::Default), None);
        let renderer = RecordingRenderer::default();
        let writer = ArtifactWriter::new(&paths, Some(Network::Default), PlotSettings::default())
            .with_renderer(&renderer);

        let nodes = coordinate_set(5);
        let matrix = Array2::<f64>::zeros((5, 5));
        let signal = SignalMatrix::new(Array2::zeros((10, 5)));
        let written = writer.render(&GraphArtifacts {
            matrix: &matrix,
            nodes: &nodes,
            model: Some(ConnectivityModel::Corr),
            edge_threshold: "50.0%",
            signal: Some(&signal),
        });

        assert_eq!(*renderer.calls.lock().unwrap(), vec!["adjacency", "timeseries"]);
        assert_eq!(written.len(), 2);
        assert_eq!(writer.title(), "Connectivity Projected on the Default");
    }

    #[test]
    fn test_large_whole_brain_graph_gets_connectogram_without_timeseries() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "997", None, None);
        let renderer = RecordingRenderer::default();
        let writer =
            ArtifactWriter::new(&paths, None, PlotSettings::default()).with_renderer(&renderer);

        let nodes = coordinate_set(20);
        let matrix = Array2::<f64>::zeros((20, 20));
        let signal = SignalMatrix::new(Array2::zeros((10, 20)));
        writer.render(&GraphArtifacts {
            matrix: &matrix,
            nodes: &nodes,
            model: Some(ConnectivityModel::Cov),
            edge_threshold: "10.0%",
            signal: Some(&signal),
        });
        assert_eq!(*renderer.calls.lock().unwrap(), vec!["connectogram", "adjacency"]);
    }

    #[test]
    fn test_node_lists_round_trip_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "s1", None, None);
        let writer = ArtifactWriter::new(&paths, None, PlotSettings::default());

        let (coords, labels) = writer.write_node_lists(&coordinate_set(3)).unwrap();
        let coords: Vec<[f64; 3]> =
            serde_json::from_str(&std::fs::read_to_string(coords).unwrap()).unwrap();
        let labels: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(labels).unwrap()).unwrap();
        assert_eq!(coords[2], [2.0, 0.0, 0.0]);
        assert_eq!(labels, vec!["n0", "n1", "n2"]);
        assert!(writer.write_parcels(&coordinate_set(3)).unwrap().is_none());
    }
}
