// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Node and node set model.

A node is either a point in world space or a parcel: a set of voxels of the
atlas grid that shared one label value. A [`NodeSet`] fixes the order of its
nodes; that order is the row/column order of every matrix derived from it.
*/

use crate::{NodeError, NodeResult};
use connectometry_volume::{Volume, VoxelGrid, VoxelIndex, WorldCoordinate};

/// Voxels of one atlas region
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    /// Label value the region carried in the source atlas
    pub label_value: f32,
    /// Voxel indices in the atlas grid
    pub voxels: Vec<VoxelIndex>,
    /// World-space centre of mass
    pub centroid: WorldCoordinate,
}

impl Parcel {
    /// Build a parcel and compute its centroid; `None` when `voxels` is empty
    pub fn from_voxels(label_value: f32, voxels: Vec<VoxelIndex>, grid: &VoxelGrid) -> Option<Self> {
        if voxels.is_empty() {
            return None;
        }
        let mut sum = [0.0f64; 3];
        for voxel in &voxels {
            for axis in 0..3 {
                sum[axis] += voxel[axis] as f64;
            }
        }
        let n = voxels.len() as f64;
        let centroid = grid
            .affine
            .voxel_to_world([sum[0] / n, sum[1] / n, sum[2] / n]);
        Some(Self {
            label_value,
            voxels,
            centroid,
        })
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }
}

/// Spatial representation of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeGeometry {
    Coordinate(WorldCoordinate),
    Parcel(Parcel),
}

/// One graph vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Position in the originally resolved atlas
    pub index: usize,
    pub label: String,
    pub geometry: NodeGeometry,
}

impl Node {
    /// World location: the coordinate itself, or the parcel centroid
    pub fn location(&self) -> WorldCoordinate {
        match &self.geometry {
            NodeGeometry::Coordinate(c) => *c,
            NodeGeometry::Parcel(p) => p.centroid,
        }
    }

    pub fn parcel(&self) -> Option<&Parcel> {
        match &self.geometry {
            NodeGeometry::Parcel(p) => Some(p),
            NodeGeometry::Coordinate(_) => None,
        }
    }
}

/// What kind of nodes a set holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeLayout {
    Coordinates,
    /// Parcels, all defined on this grid
    Parcels(VoxelGrid),
}

/// Ordered nodes of one atlas
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSet {
    atlas: String,
    layout: NodeLayout,
    nodes: Vec<Node>,
}

impl NodeSet {
    /// Create a node set, rejecting nodes whose geometry disagrees with `layout`
    pub fn new(atlas: impl Into<String>, layout: NodeLayout, nodes: Vec<Node>) -> NodeResult<Self> {
        for node in &nodes {
            match (&layout, &node.geometry) {
                (NodeLayout::Coordinates, NodeGeometry::Coordinate(_)) => {}
                (NodeLayout::Parcels(grid), NodeGeometry::Parcel(parcel)) => {
                    if let Some(v) = parcel.voxels.iter().find(|v| !grid.contains(**v)) {
                        return Err(NodeError::LayoutMismatch(format!(
                            "node {} has voxel {:?} outside grid {:?}",
                            node.index, v, grid.shape
                        )));
                    }
                }
                _ => {
                    return Err(NodeError::LayoutMismatch(format!(
                        "node {} ('{}') in a {:?} set",
                        node.index,
                        node.label,
                        layout_name(&layout)
                    )))
                }
            }
        }
        Ok(Self {
            atlas: atlas.into(),
            layout,
            nodes,
        })
    }

    /// Same atlas and layout, different nodes
    pub fn derive(&self, nodes: Vec<Node>) -> NodeResult<Self> {
        Self::new(self.atlas.clone(), self.layout, nodes)
    }

    /// Same nodes under another atlas name
    pub fn renamed(self, atlas: impl Into<String>) -> Self {
        Self {
            atlas: atlas.into(),
            ..self
        }
    }

    /// Replace every label, in node order; `None` when the count differs
    pub fn relabelled(&self, labels: Vec<String>) -> Option<Self> {
        if labels.len() != self.nodes.len() {
            return None;
        }
        let nodes = self
            .nodes
            .iter()
            .zip(labels)
            .map(|(node, label)| Node {
                label,
                ..node.clone()
            })
            .collect();
        Some(Self {
            atlas: self.atlas.clone(),
            layout: self.layout,
            nodes,
        })
    }

    pub fn atlas(&self) -> &str {
        &self.atlas
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_parcellated(&self) -> bool {
        matches!(self.layout, NodeLayout::Parcels(_))
    }

    pub fn parcel_grid(&self) -> Option<&VoxelGrid> {
        match &self.layout {
            NodeLayout::Parcels(grid) => Some(grid),
            NodeLayout::Coordinates => None,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.label.clone()).collect()
    }

    /// Node locations in order (parcel centroids for parcel nodes)
    pub fn coordinates(&self) -> Vec<WorldCoordinate> {
        self.nodes.iter().map(Node::location).collect()
    }

    /// Combined label volume with parcels relabelled `1..=N` in node order
    pub fn label_volume(&self) -> Option<Volume> {
        let grid = self.parcel_grid()?;
        let mut volume = Volume::zeros(grid);
        let data = volume.data_mut();
        for (k, parcel) in self.nodes.iter().filter_map(Node::parcel).enumerate() {
            for v in &parcel.voxels {
                data[[v[0], v[1], v[2]]] = (k + 1) as f32;
            }
        }
        Some(volume)
    }

    /// One binary volume per parcel, in node order
    pub fn parcel_volumes(&self) -> Vec<Volume> {
        let Some(grid) = self.parcel_grid() else {
            return Vec::new();
        };
        self.nodes
            .iter()
            .filter_map(Node::parcel)
            .map(|parcel| {
                let mut volume = Volume::zeros(grid);
                let data = volume.data_mut();
                for v in &parcel.voxels {
                    data[[v[0], v[1], v[2]]] = 1.0;
                }
                volume
            })
            .collect()
    }
}

fn layout_name(layout: &NodeLayout) -> &'static str {
    match layout {
        NodeLayout::Coordinates => "coordinate",
        NodeLayout::Parcels(_) => "parcel",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectometry_volume::Affine;

    fn grid() -> VoxelGrid {
        VoxelGrid::new([4, 4, 4], Affine::scaled([2.0; 3], [0.0; 3]).unwrap())
    }

    fn parcel_node(index: usize, voxels: Vec<VoxelIndex>) -> Node {
        Node {
            index,
            label: format!("region{}", index),
            geometry: NodeGeometry::Parcel(
                Parcel::from_voxels(index as f32 + 1.0, voxels, &grid()).unwrap(),
            ),
        }
    }

    #[test]
    fn test_parcel_centroid_is_world_space_mean() {
        let parcel = Parcel::from_voxels(3.0, vec![[0, 0, 0], [2, 0, 0]], &grid()).unwrap();
        assert_eq!(parcel.centroid, [2.0, 0.0, 0.0]);
        assert!(Parcel::from_voxels(1.0, Vec::new(), &grid()).is_none());
    }

    #[test]
    fn test_layout_mismatch_is_rejected() {
        let coord = Node {
            index: 0,
            label: "a".into(),
            geometry: NodeGeometry::Coordinate([0.0; 3]),
        };
        let err = NodeSet::new("atlas", NodeLayout::Parcels(grid()), vec![coord]).unwrap_err();
        assert!(matches!(err, NodeError::LayoutMismatch(_)));

        let parcel = parcel_node(0, vec![[0, 0, 0]]);
        assert!(NodeSet::new("atlas", NodeLayout::Coordinates, vec![parcel]).is_err());
    }

    #[test]
    fn test_label_volume_relabels_in_node_order() {
        let set = NodeSet::new(
            "atlas",
            NodeLayout::Parcels(grid()),
            vec![parcel_node(4, vec![[1, 1, 1]]), parcel_node(9, vec![[3, 3, 3], [3, 3, 2]])],
        )
        .unwrap();

        let volume = set.label_volume().unwrap();
        assert_eq!(volume.get([1, 1, 1]), Some(1.0));
        assert_eq!(volume.get([3, 3, 2]), Some(2.0));
        assert_eq!(volume.count_nonzero(), 3);

        let regions = set.parcel_volumes();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].count_nonzero(), 2);
    }

    #[test]
    fn test_relabel_requires_matching_count() {
        let set = NodeSet::new("atlas", NodeLayout::Parcels(grid()), vec![parcel_node(0, vec![[0, 0, 0]])])
            .unwrap();
        assert!(set.relabelled(vec!["x".into(), "y".into()]).is_none());
        assert_eq!(set.relabelled(vec!["x".into()]).unwrap().labels(), vec!["x".to_string()]);
    }
}
