// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Renderer writing PNG images and connectogram JSON documents.

Images are square, `image_size` pixels on a side. The connectogram is a
hierarchical edge bundling document: one entry per node, named
`<hemisphere>.<label>`, listing the nodes it connects to.
*/

use crate::traits::Renderer;
use crate::types::*;
use connectometry_estimation::SignalMatrix;
use image::{Rgb, RgbImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FOREGROUND: Rgb<u8> = Rgb([40, 40, 40]);
const NODE_COLOUR: Rgb<u8> = Rgb([200, 30, 30]);

/// Half-width of the axial view in mm
const AXIAL_EXTENT_MM: f64 = 100.0;

/// Viridis anchors, evenly spaced over `[0, 1]`
const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

/// One node of a connectogram document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectogramNode {
    pub name: String,
    /// Number of retained edges
    pub size: usize,
    pub imports: Vec<String>,
    /// Edge weights, aligned with `imports`
    pub weights: Vec<f64>,
}

/// Complete connectogram document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connectogram {
    pub title: String,
    pub model: String,
    pub edge_threshold: String,
    pub nodes: Vec<ConnectogramNode>,
}

impl Connectogram {
    pub fn from_plot(plot: &GraphPlot<'_>) -> Self {
        let names: Vec<String> = plot
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let hemisphere = match plot.coordinates.get(i) {
                    Some(c) if c[0] < 0.0 => "lh",
                    _ => "rh",
                };
                format!("{}.{}", hemisphere, label)
            })
            .collect();

        let n = plot.matrix.nrows();
        let nodes = (0..n)
            .map(|i| {
                let (imports, weights): (Vec<String>, Vec<f64>) = (0..n)
                    .filter(|&j| j != i && plot.matrix[[i, j]] != 0.0)
                    .map(|j| (names[j].clone(), plot.matrix[[i, j]]))
                    .unzip();
                ConnectogramNode {
                    name: names[i].clone(),
                    size: imports.len(),
                    imports,
                    weights,
                }
            })
            .collect();

        Self {
            title: plot.title.to_string(),
            model: plot.model.map_or("structural", |m| m.id()).to_string(),
            edge_threshold: plot.edge_threshold.to_string(),
            nodes,
        }
    }
}

/// Default implementation of Renderer
#[derive(Debug, Clone, Copy)]
pub struct ImageRenderer {
    settings: PlotSettings,
}

impl ImageRenderer {
    pub fn new(settings: PlotSettings) -> Self {
        Self { settings }
    }

    fn size(&self) -> u32 {
        self.settings.image_size.max(16)
    }

    fn save(&self, image: &RgbImage, output: &Path) -> RenderResult<PathBuf> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image.save(output)?;
        debug!("Wrote {}", output.display());
        Ok(output.to_path_buf())
    }
}

impl Default for ImageRenderer {
    fn default() -> Self {
        Self::new(PlotSettings::default())
    }
}

impl Renderer for ImageRenderer {
    fn connectogram(&self, plot: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf> {
        check_plot(plot)?;
        let document = Connectogram::from_plot(plot);
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, serde_json::to_string_pretty(&document)?)?;
        Ok(output.to_path_buf())
    }

    fn adjacency_matrix(&self, plot: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf> {
        check_plot(plot)?;
        let n = plot.matrix.nrows();
        let size = self.size();
        let cell = (size / n as u32).max(1);
        let side = cell * n as u32;

        let mut image = RgbImage::from_pixel(side, side, BACKGROUND);
        for ((i, j), value) in plot.matrix.indexed_iter() {
            let colour = viridis(*value);
            for dy in 0..cell {
                for dx in 0..cell {
                    image.put_pixel(j as u32 * cell + dx, i as u32 * cell + dy, colour);
                }
            }
        }
        self.save(&image, output)
    }

    fn timeseries(
        &self,
        signal: &SignalMatrix,
        labels: &[String],
        title: &str,
        output: &Path,
    ) -> RenderResult<PathBuf> {
        if signal.nodes() != labels.len() {
            return Err(RenderError::InvalidInput(format!(
                "{}: {} labels for {} signals",
                title,
                labels.len(),
                signal.nodes()
            )));
        }
        let data = signal.data();
        let size = self.size();
        let mut image = RgbImage::from_pixel(size, size, BACKGROUND);
        let (t, n) = data.dim();
        if t < 2 || n == 0 {
            return self.save(&image, output);
        }

        let (lo, hi) = data
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let span = if hi > lo { hi - lo } else { 1.0 };
        let margin = size as f64 * 0.05;
        let usable = size as f64 - 2.0 * margin;

        for j in 0..n {
            let colour = viridis(j as f64 / n.max(2).saturating_sub(1) as f64);
            let point = |k: usize| {
                let x = margin + usable * k as f64 / (t - 1) as f64;
                let value = if data[[k, j]].is_finite() { data[[k, j]] } else { lo };
                let y = margin + usable * (1.0 - (value - lo) / span);
                (x.round() as i64, y.round() as i64)
            };
            for k in 1..t {
                draw_line(&mut image, point(k - 1), point(k), colour);
            }
        }
        self.save(&image, output)
    }

    fn connectome(&self, plot: &GraphPlot<'_>, output: &Path) -> RenderResult<PathBuf> {
        check_plot(plot)?;
        if plot.coordinates.len() != plot.matrix.nrows() {
            return Err(RenderError::InvalidInput(format!(
                "{} coordinates for {} nodes",
                plot.coordinates.len(),
                plot.matrix.nrows()
            )));
        }
        let percentile = parse_percent(plot.edge_threshold)?;
        let cutoff = edge_cutoff(plot.matrix, percentile);

        let size = self.size();
        let mut image = RgbImage::from_pixel(size, size, BACKGROUND);
        let project = |c: &[f64; 3]| {
            let scale = size as f64 / (2.0 * AXIAL_EXTENT_MM);
            let x = (c[0] + AXIAL_EXTENT_MM) * scale;
            let y = (AXIAL_EXTENT_MM - c[1]) * scale;
            (x.round() as i64, y.round() as i64)
        };

        // head outline
        let centre = (size as i64 / 2, size as i64 / 2);
        draw_circle(&mut image, centre, (size as i64 / 2) - 2, FOREGROUND, false);

        let n = plot.matrix.nrows();
        for i in 0..n {
            for j in (i + 1)..n {
                let w = plot.matrix[[i, j]].abs();
                if w > 0.0 && w >= cutoff {
                    draw_line(
                        &mut image,
                        project(&plot.coordinates[i]),
                        project(&plot.coordinates[j]),
                        viridis(w),
                    );
                }
            }
        }
        let radius = (size as i64 / 120).max(2);
        for c in plot.coordinates {
            draw_circle(&mut image, project(c), radius, NODE_COLOUR, true);
        }
        self.save(&image, output)
    }
}

fn check_plot(plot: &GraphPlot<'_>) -> RenderResult<()> {
    let (rows, cols) = plot.matrix.dim();
    if rows == 0 || rows != cols {
        return Err(RenderError::InvalidInput(format!(
            "'{}' needs a non-empty square matrix, got {}x{}",
            plot.title, rows, cols
        )));
    }
    if plot.labels.len() != rows {
        return Err(RenderError::InvalidInput(format!(
            "'{}' has {} labels for {} nodes",
            plot.title,
            plot.labels.len(),
            rows
        )));
    }
    Ok(())
}

/// `"50.0%"` → `50.0`
pub(crate) fn parse_percent(text: &str) -> RenderResult<f64> {
    let value: f64 = text
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| RenderError::InvalidInput(format!("bad edge threshold '{}'", text)))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(RenderError::InvalidInput(format!(
            "edge threshold '{}' is outside 0-100%",
            text
        )));
    }
    Ok(value)
}

/// Linear-interpolated percentile of absolute upper-triangle weights
pub(crate) fn edge_cutoff(matrix: &Array2<f64>, percentile: f64) -> f64 {
    let n = matrix.nrows();
    let mut weights: Vec<f64> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .map(|(i, j)| matrix[[i, j]].abs())
        .filter(|w| w.is_finite())
        .collect();
    if weights.is_empty() {
        return 0.0;
    }
    weights.sort_by(|a, b| a.total_cmp(b));
    let rank = percentile / 100.0 * (weights.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    weights[lower] + (weights[upper] - weights[lower]) * (rank - lower as f64)
}

fn viridis(value: f64) -> Rgb<u8> {
    let v = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = v * (VIRIDIS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lower as f64;
    let mut out = [0u8; 3];
    for (c, value) in out.iter_mut().enumerate() {
        let a = VIRIDIS[lower][c] as f64;
        let b = VIRIDIS[lower + 1][c] as f64;
        *value = (a + (b - a) * frac).round() as u8;
    }
    Rgb(out)
}

fn plot_pixel(image: &mut RgbImage, x: i64, y: i64, colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, colour);
    }
}

/// Bresenham
fn draw_line(image: &mut RgbImage, from: (i64, i64), to: (i64, i64), colour: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        plot_pixel(image, x, y, colour);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_circle(image: &mut RgbImage, centre: (i64, i64), radius: i64, colour: Rgb<u8>, filled: bool) {
    let r2 = radius * radius;
    let inner = (radius - 1).max(0).pow(2);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = dx * dx + dy * dy;
            if d2 <= r2 && (filled || d2 >= inner) {
                plot_pixel(image, centre.0 + dx, centre.1 + dy, colour);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectometry_estimation::ConnectivityModel;
    use ndarray::array;

    fn plot<'a>(
        matrix: &'a Array2<f64>,
        labels: &'a [String],
        coords: &'a [[f64; 3]],
    ) -> GraphPlot<'a> {
        GraphPlot {
            matrix,
            labels,
            coordinates: coords,
            title: "test graph",
            model: Some(ConnectivityModel::Corr),
            edge_threshold: "50.0%",
        }
    }

    #[test]
    fn test_percent_parsing() {
        assert_eq!(parse_percent("50.0%").unwrap(), 50.0);
        assert_eq!(parse_percent(" 5% ").unwrap(), 5.0);
        assert!(parse_percent("half").is_err());
        assert!(parse_percent("150%").is_err());
    }

    #[test]
    fn test_edge_cutoff_interpolates() {
        let m = array![[0.0, 0.2, 0.4], [0.2, 0.0, 1.0], [0.4, 1.0, 0.0]];
        assert_eq!(edge_cutoff(&m, 0.0), 0.2);
        assert_eq!(edge_cutoff(&m, 50.0), 0.4);
        assert_eq!(edge_cutoff(&m, 100.0), 1.0);
        assert!((edge_cutoff(&m, 25.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_connectogram_document() {
        let m = array![[0.0, 0.5, 0.0], [0.5, 0.0, 1.0], [0.0, 1.0, 0.0]];
        let labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let coords = [[-10.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 5.0, 5.0]];
        let doc = Connectogram::from_plot(&plot(&m, &labels, &coords));

        assert_eq!(doc.model, "corr");
        assert_eq!(doc.nodes[0].name, "lh.A");
        assert_eq!(doc.nodes[0].imports, vec!["rh.B".to_string()]);
        assert_eq!(doc.nodes[1].size, 2);
        assert_eq!(doc.nodes[1].weights, vec![0.5, 1.0]);
    }

    #[test]
    fn test_renders_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ImageRenderer::new(PlotSettings {
            min_connectogram_nodes: 20,
            image_size: 64,
        });
        let m = array![[0.0, 0.5, 0.2], [0.5, 0.0, 1.0], [0.2, 1.0, 0.0]];
        let labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let coords = [[-40.0, 20.0, 0.0], [40.0, 20.0, 0.0], [0.0, -60.0, 10.0]];
        let p = plot(&m, &labels, &coords);

        let adj = renderer
            .adjacency_matrix(&p, &dir.path().join("adj.png"))
            .unwrap();
        let img = image::open(&adj).unwrap();
        // 64 / 3 = 21 pixel cells
        assert_eq!(img.width(), 63);

        let viz = renderer.connectome(&p, &dir.path().join("viz.png")).unwrap();
        assert_eq!(image::open(&viz).unwrap().width(), 64);

        let json = renderer.connectogram(&p, &dir.path().join("c.json")).unwrap();
        let doc: Connectogram = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(doc.nodes.len(), 3);

        let signal = SignalMatrix::new(Array2::from_shape_fn((10, 3), |(t, j)| (t * (j + 1)) as f64));
        let ts = renderer
            .timeseries(&signal, &labels, "ts", &dir.path().join("ts.png"))
            .unwrap();
        assert!(ts.exists());
    }

    #[test]
    fn test_label_mismatch_rejected() {
        let m = Array2::<f64>::zeros((3, 3));
        let labels = vec!["A".to_string()];
        let coords = [[0.0; 3]; 3];
        let renderer = ImageRenderer::default();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            renderer.adjacency_matrix(&plot(&m, &labels, &coords), &dir.path().join("x.png")),
            Err(RenderError::InvalidInput(_))
        ));
    }
}
