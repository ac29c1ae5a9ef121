// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Connectometry Nodes

Turns an atlas into the ordered set of graph nodes a connectome is built on:

- **Atlas resolution**: built-in catalog or user files → coordinate or parcel nodes
- **Label resolution**: catalog / embedded labels, reference files, synthesized `1..N`
- **Node selection**: restriction to one Yeo 7-network sub-network
- **Spatial masking**: intersection with a binary region-of-interest mask

Each stage returns a new [`NodeSet`]; node sets are never edited in place, and
every [`Node`] carries its own label and geometry so they cannot drift apart.
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod catalog;
pub mod labels;
pub mod masker;
pub mod node;
pub mod parcellation;
pub mod resolver;
pub mod selector;
pub mod types;

pub use catalog::{AtlasCatalog, AtlasKind, CatalogEntry};
pub use labels::{parse_label_file, synthesize_labels};
pub use masker::{mask_name, SpatialMasker};
pub use node::{Node, NodeGeometry, NodeLayout, NodeSet, Parcel};
pub use parcellation::split_parcels;
pub use resolver::{AtlasRequest, AtlasResolver, ResolvedAtlas};
pub use selector::{Network, NodeSelector};
pub use types::{NodeError, NodeResult};
