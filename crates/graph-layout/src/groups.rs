use std::collections::HashMap;
use std::hash::Hash;

/// Trait for providing the group of each node during layout computation
///
/// The group decides which band a node lands in, the rank decides its
/// position inside the band. Both must be derived from the node's own
/// attributes so the layout does not depend on graph iteration order.
pub trait NodeGroups<N> {
    /// Key of a band, bands are laid out in ascending order
    type Group: Ord + Clone;

    /// Ordering of nodes inside a band
    type Rank: Ord;

    /// Get the group and rank of a node
    fn key(&self, node: N) -> (Self::Group, Self::Rank);
}

// Any `Fn(node) -> (group, rank)` closure
impl<N, F, K, R> NodeGroups<N> for F
where
    F: Fn(N) -> (K, R),
    K: Ord + Clone,
    R: Ord,
{
    type Group = K;
    type Rank = R;

    fn key(&self, node: N) -> (K, R) {
        self(node)
    }
}

// Nodes are ranked by their own id, nodes missing from the map fall into the
// default group
impl<N, K> NodeGroups<N> for HashMap<N, K>
where
    N: Eq + Hash + Ord + Copy,
    K: Ord + Clone + Default,
{
    type Group = K;
    type Rank = N;

    fn key(&self, node: N) -> (K, N) {
        (self.get(&node).cloned().unwrap_or_default(), node)
    }
}
