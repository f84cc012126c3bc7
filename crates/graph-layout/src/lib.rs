//! Banded grid layout for petgraph graphs
//!
//! Nodes are split into groups, each group gets a horizontal band and the
//! nodes of a band are lined up by rank. Only the keys reported through
//! [`NodeGroups`] are looked at, never the edges nor the iteration order of
//! the graph, so a layout can be reproduced from the node attributes alone.
//!
//! - [`GridLayout`]: the band layout, with its pitch and caption offset
//!
//! # Example
//!
//! ```
//! use graph_layout::{GridLayout, LayoutEngine, Point};
//! use petgraph::graphmap::UnGraphMap;
//!
//! // A path 1-2-3
//! let mut graph = UnGraphMap::<u32, ()>::new();
//! graph.add_edge(1, 2, ());
//! graph.add_edge(2, 3, ());
//!
//! let engine = GridLayout::default();
//!
//! // Odd and even nodes in separate bands, ranked by value
//! let groups = |node: u32| (node % 2, node);
//!
//! // Even nodes form the first band, at y = 0
//! let layout = engine.layout(&graph, &groups);
//! assert_eq!(layout.positions[&2], Point::new(0.0, 0.0));
//!
//! // The same phases can be run one at a time
//! let bands = engine.compute_bands(&graph, &groups);
//! let positions = engine.compute_positions(&bands);
//! let anchors = engine.compute_anchors(&bands, &positions);
//! assert_eq!(anchors.len(), 2);
//! ```

mod engine;
mod geometry;
mod groups;

pub mod grid;

pub use engine::{Layout, LayoutEngine};
pub use geometry::{Point, Vec2};
pub use groups::NodeGroups;

pub use petgraph::visit::{GraphBase, IntoNodeIdentifiers};

pub use grid::{Band, GridLayout, GridLayoutError};
