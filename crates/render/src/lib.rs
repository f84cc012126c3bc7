//! Output documents for a topology
//!
//! - [`svg`]: static drawing of a laid out graph
//! - [`html`]: interactive page, positions computed in the browser
//! - [`report`]: tables of the records that are not part of the graph

pub mod html;
pub mod report;
pub mod svg;

pub use html::render_html;
pub use report::render_report;
pub use svg::render_svg;

/// Escape text for use in XML and HTML content or attribute values
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
