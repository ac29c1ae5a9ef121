// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # connectometry-observability
//!
//! Logging initialisation shared by the connectometry crates and binaries.
//!
//! Provides consistent `tracing` output across the workspace with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files per run with retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Workspace crate names accepted by `--debug-{crate}` flags
pub const KNOWN_CRATES: &[&str] = &[
    "connectometry",
    "connectometry-config",
    "connectometry-volume",
    "connectometry-nodes",
    "connectometry-estimation",
    "connectometry-services",
];

/// `tracing` targets use the module path, which spells crate names with underscores
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
