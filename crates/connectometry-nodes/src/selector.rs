// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Sub-network node selection against the Yeo 7-network template.
*/

use crate::{NodeError, NodeResult, NodeSet};
use connectometry_volume::{read_volume, Volume, VoxelGrid};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Yeo 7-network sub-networks; the discriminant is the template label value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Vis = 1,
    SomMot = 2,
    DorsAttn = 3,
    SalVentAttn = 4,
    Limbic = 5,
    Cont = 6,
    Default = 7,
}

impl Network {
    pub const ALL: [Network; 7] = [
        Network::Vis,
        Network::SomMot,
        Network::DorsAttn,
        Network::SalVentAttn,
        Network::Limbic,
        Network::Cont,
        Network::Default,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Vis => "Vis",
            Network::SomMot => "SomMot",
            Network::DorsAttn => "DorsAttn",
            Network::SalVentAttn => "SalVentAttn",
            Network::Limbic => "Limbic",
            Network::Cont => "Cont",
            Network::Default => "Default",
        }
    }

    pub fn label_value(&self) -> f32 {
        *self as i32 as f32
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|n| n.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NodeError::UnknownNetwork(s.to_string()))
    }
}

/// Network membership lookup backed by a template label volume
pub struct NodeSelector {
    template: Volume,
}

impl NodeSelector {
    pub fn new(template: Volume) -> Self {
        Self { template }
    }

    pub fn load(template_path: &Path) -> NodeResult<Self> {
        Ok(Self::new(read_volume(template_path)?))
    }

    /// Nodes whose location carries the network's template label and lies
    /// inside the reference field of view. Parcel geometry is carried along.
    pub fn select(&self, nodes: &NodeSet, network: Network, reference: &VoxelGrid) -> NodeResult<NodeSet> {
        let wanted = network.label_value();
        let members: Vec<_> = nodes
            .nodes()
            .iter()
            .filter(|node| {
                let location = node.location();
                reference.nearest_voxel(location).is_some()
                    && self.template.value_at_world(location) == Some(wanted)
            })
            .cloned()
            .collect();

        if members.is_empty() {
            warn!(network = %network, atlas = nodes.atlas(), "No nodes fall within the network");
        } else {
            info!(
                network = %network,
                selected = members.len(),
                total = nodes.len(),
                "Selected network nodes"
            );
        }
        nodes.derive(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, NodeGeometry, NodeLayout};
    use connectometry_volume::Affine;
    use ndarray::Array3;

    fn template() -> Volume {
        // x < 5 is Vis, x >= 5 is Default
        let mut data = Array3::zeros((10, 4, 4));
        for ((i, _, _), v) in data.indexed_iter_mut() {
            *v = if i < 5 { 1.0 } else { 7.0 };
        }
        Volume::new(data, Affine::identity())
    }

    fn coords(points: &[[f64; 3]]) -> NodeSet {
        let nodes = points
            .iter()
            .enumerate()
            .map(|(index, p)| Node {
                index,
                label: format!("n{}", index),
                geometry: NodeGeometry::Coordinate(*p),
            })
            .collect();
        NodeSet::new("test", NodeLayout::Coordinates, nodes).unwrap()
    }

    #[test]
    fn test_network_names_are_case_insensitive() {
        assert_eq!("default".parse::<Network>().unwrap(), Network::Default);
        assert_eq!("SALVENTATTN".parse::<Network>().unwrap(), Network::SalVentAttn);
        assert!(matches!("Motor".parse::<Network>(), Err(NodeError::UnknownNetwork(_))));
        assert_eq!(Network::Cont.label_value(), 6.0);
    }

    #[test]
    fn test_membership_by_template_label() {
        let selector = NodeSelector::new(template());
        let reference = VoxelGrid::new([10, 4, 4], Affine::identity());
        let set = coords(&[[1.0, 1.0, 1.0], [8.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);

        let vis = selector.select(&set, Network::Vis, &reference).unwrap();
        assert_eq!(vis.labels(), vec!["n0", "n2"]);
        assert_eq!(vis.nodes()[1].index, 2);

        let limbic = selector.select(&set, Network::Limbic, &reference).unwrap();
        assert!(limbic.is_empty());
    }

    #[test]
    fn test_nodes_outside_reference_are_dropped() {
        let selector = NodeSelector::new(template());
        let reference = VoxelGrid::new([2, 2, 2], Affine::identity());
        let set = coords(&[[1.0, 1.0, 1.0], [3.0, 1.0, 1.0]]);

        let vis = selector.select(&set, Network::Vis, &reference).unwrap();
        assert_eq!(vis.labels(), vec!["n0"]);
    }
}
