// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Plain-text matrices: one row per line, values separated by spaces.
//!
//! Values are written in `%.18e` notation with a signed two-digit exponent
//! (`1.500000000000000000e+00`), which other numeric tools load directly.

use crate::{VolumeError, VolumeResult};
use ndarray::Array2;
use std::fmt::Write as _;
use std::path::Path;

/// Write a matrix; parent directories are created as needed
pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> VolumeResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut out = String::with_capacity(matrix.len() * 26);
    for row in matrix.rows() {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format_scientific(*value));
        }
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Read a matrix written by [`write_matrix`] (commas are accepted as separators)
pub fn read_matrix(path: &Path) -> VolumeResult<Array2<f64>> {
    let text = std::fs::read_to_string(path)?;
    let parse_error = |line: usize, reason: String| VolumeError::Parse {
        path: path.display().to_string(),
        line,
        reason,
    };

    let mut values = Vec::new();
    let mut width = None;
    let mut rows = 0;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let start = values.len();
        for token in line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let value = token
                .parse::<f64>()
                .map_err(|e| parse_error(line_no + 1, format!("'{}': {}", token, e)))?;
            values.push(value);
        }
        let count = values.len() - start;
        match width {
            None => width = Some(count),
            Some(w) if w != count => {
                return Err(parse_error(
                    line_no + 1,
                    format!("expected {} columns, found {}", w, count),
                ))
            }
            _ => {}
        }
        rows += 1;
    }

    Array2::from_shape_vec((rows, width.unwrap_or(0)), values)
        .map_err(|e| VolumeError::ShapeMismatch(e.to_string()))
}

/// `%.18e` with a sign and at least two exponent digits
fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let raw = format!("{:.18e}", value);
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut out = String::with_capacity(mantissa.len() + 5);
    out.push_str(mantissa);
    let sign = if exponent < 0 { '-' } else { '+' };
    let _ = write!(out, "e{}{:02}", sign, exponent.abs());
    out
}
