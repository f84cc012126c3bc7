use super::Band;
use crate::{Point, Vec2};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Assign coordinates to nodes based on their band and rank
///
/// Band `i` sits at `y = -i * pitch.y` and the `j`-th node of a band at
/// `x = j * pitch.x`.
pub(crate) fn assign_coordinates<N, K>(bands: &[Band<N, K>], pitch: Vec2) -> HashMap<N, Point>
where
    N: Copy + Eq + Hash,
{
    let mut positions = HashMap::new();

    for (row, band) in bands.iter().enumerate() {
        // Subtract from zero so the first band is at 0.0 and not -0.0
        let y = 0.0 - row as f32 * pitch.y;
        for (column, &node) in band.nodes.iter().enumerate() {
            positions.insert(node, Point::new(column as f32 * pitch.x, y));
        }
    }

    positions
}

/// Place one caption anchor per band, centered over its nodes and
/// `label_offset` below the lowest one
pub(crate) fn assign_anchors<N, K>(
    bands: &[Band<N, K>],
    positions: &HashMap<N, Point>,
    label_offset: f32,
) -> BTreeMap<K, Point>
where
    N: Copy + Eq + Hash,
    K: Ord + Clone,
{
    let mut anchors = BTreeMap::new();

    for band in bands {
        let points: Vec<Point> = band
            .nodes
            .iter()
            .filter_map(|node| positions.get(node).copied())
            .collect();

        if points.is_empty() {
            continue;
        }

        let mean_x = points.iter().map(|p| p.x).sum::<f32>() / points.len() as f32;
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);

        anchors.insert(band.group.clone(), Point::new(mean_x, min_y - label_offset));
    }

    anchors
}
