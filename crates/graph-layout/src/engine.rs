use crate::{NodeGroups, Point};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Output of a layout engine
#[derive(Debug, Clone, PartialEq)]
pub struct Layout<N, K>
where
    N: Eq + Hash,
    K: Ord,
{
    /// Position of every node of the graph
    pub positions: HashMap<N, Point>,

    /// Caption anchor of every group
    pub anchors: BTreeMap<K, Point>,
}

impl<N, K> Default for Layout<N, K>
where
    N: Eq + Hash,
    K: Ord,
{
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
            anchors: BTreeMap::new(),
        }
    }
}

/// Places the nodes of a graph of type `G` and captions its groups
///
/// The graph only has to list its nodes. Which band a node goes to comes from
/// the [`NodeGroups`] passed along, so one graph can be laid out under
/// several groupings.
pub trait LayoutEngine<G> {
    /// Node handle of the graph, also the key of the output positions
    type NodeId: Copy + Eq + Hash;

    /// Position every node and put one caption anchor under each group
    fn layout<S>(&self, graph: G, groups: &S) -> Layout<Self::NodeId, S::Group>
    where
        S: NodeGroups<Self::NodeId>;
}
