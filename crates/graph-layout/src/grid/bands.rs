use super::Band;
use crate::NodeGroups;
use petgraph::visit::IntoNodeIdentifiers;
use std::collections::BTreeMap;

/// Partition the nodes of a graph into bands
///
/// Bands come out sorted by group and the nodes of each band sorted by rank,
/// so the result only depends on what `groups` says about each node and not
/// on the order in which the graph yields them.
pub(crate) fn assign_bands<G, S>(graph: G, groups: &S) -> Vec<Band<G::NodeId, S::Group>>
where
    G: IntoNodeIdentifiers,
    S: NodeGroups<G::NodeId>,
{
    let mut members: BTreeMap<S::Group, Vec<(S::Rank, G::NodeId)>> = BTreeMap::new();
    for node in graph.node_identifiers() {
        let (group, rank) = groups.key(node);
        members.entry(group).or_default().push((rank, node));
    }

    members
        .into_iter()
        .map(|(group, mut nodes)| {
            nodes.sort_by(|a, b| a.0.cmp(&b.0));
            Band {
                group,
                nodes: nodes.into_iter().map(|(_, node)| node).collect(),
            }
        })
        .collect()
}
