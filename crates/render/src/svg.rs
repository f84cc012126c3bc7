//! Static SVG drawing of a laid out topology
//!
//! Layout coordinates are y-up and unitless. They are scaled and flipped into
//! the SVG viewport, with room above for the title and below for the legend.

use crate::escape_xml;
use tracing::debug;
use vpcmap_topology::{NodeCategory, Point, TopologyGraph, TopologyLayout};

pub const TITLE: &str = "GCP VPC Topology";

/// Pixels per layout unit
const SCALE: f32 = 24.0;
const MARGIN: f32 = 80.0;
const TITLE_HEIGHT: f32 = 40.0;
const LEGEND_HEIGHT: f32 = 40.0;
const LEGEND_ENTRY_WIDTH: f32 = 180.0;
const NODE_RADIUS: f32 = 14.0;

/// Mapping from layout space to the viewport
struct Frame {
    min_x: f32,
    max_y: f32,
    width: f32,
    height: f32,
}

impl Frame {
    fn of(layout: &TopologyLayout) -> Self {
        let mut points = layout.positions.values().chain(layout.anchors.values());
        let Some(first) = points.next() else {
            return Self {
                min_x: 0.0,
                max_y: 0.0,
                width: Self::legend_width(),
                height: 2.0 * MARGIN + TITLE_HEIGHT + LEGEND_HEIGHT,
            };
        };

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for point in points {
            min_x = min_x.min(point.x);
            max_x = max_x.max(point.x);
            min_y = min_y.min(point.y);
            max_y = max_y.max(point.y);
        }

        Self {
            min_x,
            max_y,
            width: ((max_x - min_x) * SCALE + 2.0 * MARGIN).max(Self::legend_width()),
            height: (max_y - min_y) * SCALE + 2.0 * MARGIN + TITLE_HEIGHT + LEGEND_HEIGHT,
        }
    }

    fn legend_width() -> f32 {
        NodeCategory::ALL.len() as f32 * LEGEND_ENTRY_WIDTH + 2.0 * MARGIN
    }

    fn project(&self, point: Point) -> (f32, f32) {
        (
            (point.x - self.min_x) * SCALE + MARGIN,
            (self.max_y - point.y) * SCALE + MARGIN + TITLE_HEIGHT,
        )
    }
}

/// Draw a graph at the positions of its layout
///
/// Nodes or edges without a position in `layout` are left out.
pub fn render_svg(graph: &TopologyGraph, layout: &TopologyLayout) -> String {
    let frame = Frame::of(layout);
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="sans-serif">"#,
        w = frame.width,
        h = frame.height,
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="{:.0}" height="{:.0}" fill="white"/>"#,
        frame.width, frame.height
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="16" text-anchor="middle">{}</text>"#,
        frame.width / 2.0,
        TITLE_HEIGHT / 2.0 + 12.0,
        escape_xml(TITLE)
    ));
    svg.push('\n');

    svg.push_str(&render_edges(graph, layout, &frame));
    svg.push_str(&render_nodes(graph, layout, &frame));
    svg.push_str(&render_captions(layout, &frame));
    svg.push_str(&render_legend(&frame));
    svg.push_str("</svg>\n");

    debug!(
        "Rendered SVG with {} nodes and {} captions",
        layout.positions.len(),
        layout.anchors.len()
    );
    svg
}

fn render_edges(graph: &TopologyGraph, layout: &TopologyLayout, frame: &Frame) -> String {
    let mut svg = String::from("<g class=\"edges\" stroke=\"#555555\" stroke-opacity=\"0.5\">\n");
    let mut labels = String::new();

    for (a, b, edge) in graph.edges() {
        let (Some(&pa), Some(&pb)) = (layout.positions.get(&a.id), layout.positions.get(&b.id))
        else {
            continue;
        };
        let (x1, y1) = frame.project(pa);
        let (x2, y2) = frame.project(pb);
        svg.push_str(&format!(
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}"/>"#
        ));
        svg.push('\n');

        if let Some(label) = edge.label() {
            labels.push_str(&format!(
                r##"<text x="{:.1}" y="{:.1}" font-size="9" fill="#444444" text-anchor="middle">{}</text>"##,
                (x1 + x2) / 2.0,
                (y1 + y2) / 2.0 - 3.0,
                escape_xml(label)
            ));
            labels.push('\n');
        }
    }

    svg.push_str("</g>\n");
    svg.push_str(&labels);
    svg
}

fn render_nodes(graph: &TopologyGraph, layout: &TopologyLayout, frame: &Frame) -> String {
    let mut svg = String::from("<g class=\"nodes\">\n");

    for (id, &point) in &layout.positions {
        let Some(node) = graph.node(id) else {
            continue;
        };
        let (x, y) = frame.project(point);
        let dash = if node.placeholder {
            r#" stroke-dasharray="3,2""#
        } else {
            ""
        };

        svg.push_str(&format!(
            r##"<circle cx="{x:.1}" cy="{y:.1}" r="{NODE_RADIUS:.0}" fill="{}" stroke="#333333"{dash}><title>{}</title></circle>"##,
            node.category.color(),
            escape_xml(id.as_str())
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{:.1}" font-size="10" text-anchor="middle">{}</text>"#,
            y + NODE_RADIUS + 12.0,
            escape_xml(&node.label)
        ));
        svg.push('\n');
    }

    svg.push_str("</g>\n");
    svg
}

fn render_captions(layout: &TopologyLayout, frame: &Frame) -> String {
    let mut svg = String::from("<g class=\"captions\" font-size=\"12\" font-weight=\"bold\">\n");

    for (group, &anchor) in &layout.anchors {
        let caption = group.to_string();
        let (x, y) = frame.project(anchor);
        // Rough text width, good enough for a background box
        let width = caption.chars().count() as f32 * 7.5 + 12.0;

        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{width:.1}" height="20" rx="4" fill="lightgray" fill-opacity="0.3"/>"#,
            x - width / 2.0,
            y - 14.0,
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle">{}</text>"#,
            escape_xml(&caption)
        ));
        svg.push('\n');
    }

    svg.push_str("</g>\n");
    svg
}

fn render_legend(frame: &Frame) -> String {
    let mut svg = String::from("<g class=\"legend\" font-size=\"11\">\n");
    let total = NodeCategory::ALL.len() as f32 * LEGEND_ENTRY_WIDTH;
    let left = (frame.width - total) / 2.0;
    let y = frame.height - LEGEND_HEIGHT / 2.0 - MARGIN / 4.0;

    for (i, category) in NodeCategory::ALL.into_iter().enumerate() {
        let x = left + i as f32 * LEGEND_ENTRY_WIDTH;
        svg.push_str(&format!(
            r#"<rect x="{x:.1}" y="{:.1}" width="12" height="12" fill="{}"/>"#,
            y - 10.0,
            category.color()
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{y:.1}">{}</text>"#,
            x + 18.0,
            escape_xml(category.legend())
        ));
        svg.push('\n');
    }

    svg.push_str("</g>\n");
    svg
}
