mod bands;
mod positions;

use crate::{Layout, LayoutEngine, NodeGroups, Point, Vec2};
use petgraph::visit::IntoNodeIdentifiers;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use thiserror::Error;

use bands::assign_bands;
use positions::{assign_anchors, assign_coordinates};

/// Errors that can occur when configuring a grid layout
#[derive(Debug, Error, PartialEq)]
pub enum GridLayoutError {
    /// Both pitch components must be finite and strictly positive
    #[error("invalid pitch {0:?}, both components must be finite and positive")]
    InvalidPitch(Vec2),

    /// The caption offset must be finite
    #[error("invalid label offset {0}")]
    InvalidLabelOffset(f32),
}

/// Configuration for the grouped grid layout
///
/// Every group of nodes gets its own horizontal band. Bands are stacked
/// top to bottom in group order, nodes are spread left to right in rank
/// order. There is no physics and no randomness, the same input always
/// produces the same coordinates.
#[derive(Debug, Clone)]
pub struct GridLayout {
    /// Horizontal distance between nodes and vertical distance between bands
    pitch: Vec2,

    /// Distance between the lowest node of a band and its caption anchor
    label_offset: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            pitch: Vec2::new(5.0, 10.0),
            label_offset: 2.0,
        }
    }
}

impl GridLayout {
    /// Create a new grid layout with the given pitch and caption offset
    ///
    /// # Errors
    /// Returns an error if the pitch is not strictly positive or if either
    /// value is not finite
    pub fn new(pitch: Vec2, label_offset: f32) -> Result<Self, GridLayoutError> {
        if !pitch.is_positive() {
            return Err(GridLayoutError::InvalidPitch(pitch));
        }
        if !label_offset.is_finite() {
            return Err(GridLayoutError::InvalidLabelOffset(label_offset));
        }
        Ok(Self {
            pitch,
            label_offset,
        })
    }

    pub fn pitch(&self) -> Vec2 {
        self.pitch
    }

    pub fn label_offset(&self) -> f32 {
        self.label_offset
    }
}

/// One row of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct Band<N, K> {
    /// Group shared by every node of the band
    pub group: K,

    /// Nodes of the band, left to right
    pub nodes: Vec<N>,
}

impl GridLayout {
    /// Partition the graph into sorted bands
    ///
    /// This phase only looks at the groups and ranks reported for each node,
    /// edges are ignored.
    pub fn compute_bands<G, S>(&self, graph: G, groups: &S) -> Vec<Band<G::NodeId, S::Group>>
    where
        G: IntoNodeIdentifiers,
        S: NodeGroups<G::NodeId>,
    {
        assign_bands(graph, groups)
    }

    /// Compute node positions from the bands
    pub fn compute_positions<N, K>(&self, bands: &[Band<N, K>]) -> HashMap<N, Point>
    where
        N: Copy + Eq + Hash,
    {
        assign_coordinates(bands, self.pitch)
    }

    /// Compute one caption anchor per band from the node positions
    pub fn compute_anchors<N, K>(
        &self,
        bands: &[Band<N, K>],
        positions: &HashMap<N, Point>,
    ) -> BTreeMap<K, Point>
    where
        N: Copy + Eq + Hash,
        K: Ord + Clone,
    {
        assign_anchors(bands, positions, self.label_offset)
    }
}

// Implement LayoutEngine for any graph that can list its nodes
impl<G> LayoutEngine<G> for GridLayout
where
    G: IntoNodeIdentifiers,
    G::NodeId: Copy + Eq + Hash,
{
    type NodeId = G::NodeId;

    fn layout<S>(&self, graph: G, groups: &S) -> Layout<Self::NodeId, S::Group>
    where
        S: NodeGroups<Self::NodeId>,
    {
        let bands = self.compute_bands(graph, groups);
        let positions = self.compute_positions(&bands);
        let anchors = self.compute_anchors(&bands, &positions);
        Layout { positions, anchors }
    }
}
