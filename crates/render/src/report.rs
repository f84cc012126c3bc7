//! HTML tables of the records shown as-is: routes, firewall rules and VPN
//! tunnels

use crate::escape_xml;
use serde_json::Value;
use tracing::debug;
use vpcmap_inventory::{InventorySnapshot, Record};

const PAGE_TITLE: &str = "GCP Topology - Routes and Firewalls";
const NO_DATA: &str = "No data found.";

/// Text of a cell, strings are shown without quotes
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One titled table, columns are the keys of the first record
pub fn render_table(title: &str, records: &[Record]) -> String {
    let mut html = format!("<h2>{}</h2>\n", escape_xml(title));

    let Some(first) = records.first() else {
        html.push_str(&format!("<p>{NO_DATA}</p>\n"));
        return html;
    };
    let columns: Vec<&String> = first.keys().collect();

    html.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\n<thead><tr>");
    for column in &columns {
        html.push_str(&format!("<th>{}</th>", escape_xml(column)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for record in records {
        html.push_str("<tr>");
        for column in &columns {
            html.push_str(&format!(
                "<td>{}</td>",
                escape_xml(&cell(record.get(column.as_str())))
            ));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

/// Page with the routes, firewall rules and VPN tunnels of a snapshot
pub fn render_report(snapshot: &InventorySnapshot) -> String {
    debug!(
        "Rendering report with {} routes, {} firewall rules, {} VPN tunnels",
        snapshot.routes.len(),
        snapshot.firewall_rules.len(),
        snapshot.vpn_tunnels.len()
    );

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n",
        escape_xml(PAGE_TITLE)
    );
    html.push_str(&render_table("Routes", &snapshot.routes));
    html.push_str(&render_table("Firewall Rules", &snapshot.firewall_rules));
    html.push_str(&render_table("VPN Tunnels", &snapshot.vpn_tunnels));
    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_log::test;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_columns_follow_first_record() {
        let routes = vec![
            record(json!({ "name": "default-route", "destRange": "0.0.0.0/0", "priority": 1000 })),
            record(json!({ "priority": 10, "name": "r2", "tags": ["a", "b"] })),
        ];

        let html = render_table("Routes", &routes);

        assert!(html.contains("<tr><th>name</th><th>destRange</th><th>priority</th></tr>"));
        assert!(html.contains("<tr><td>default-route</td><td>0.0.0.0/0</td><td>1000</td></tr>"));
        // Missing keys leave the cell empty, extra keys are not shown
        assert!(html.contains("<tr><td>r2</td><td></td><td>10</td></tr>"));
        assert!(!html.contains("tags"));
    }

    #[test]
    fn test_nested_values_are_shown_as_json() {
        let rules = vec![record(json!({
            "name": "allow-ssh",
            "allowed": [{ "IPProtocol": "tcp", "ports": ["22"] }],
            "disabled": false,
            "description": null,
        }))];

        let html = render_table("Firewall Rules", &rules);

        assert!(html.contains(
            "<td>[{&quot;IPProtocol&quot;:&quot;tcp&quot;,&quot;ports&quot;:[&quot;22&quot;]}]</td>"
        ));
        assert!(html.contains("<td>false</td><td></td>"));
    }

    #[test]
    fn test_empty_table() {
        let html = render_table("VPN Tunnels", &[]);

        assert_eq!(html, "<h2>VPN Tunnels</h2>\n<p>No data found.</p>\n");
    }

    #[test]
    fn test_report_sections() {
        let snapshot = InventorySnapshot {
            firewall_rules: vec![record(json!({ "name": "<deny>" }))],
            ..Default::default()
        };

        let html = render_report(&snapshot);

        let routes = html.find("<h2>Routes</h2>").unwrap();
        let firewalls = html.find("<h2>Firewall Rules</h2>").unwrap();
        let tunnels = html.find("<h2>VPN Tunnels</h2>").unwrap();
        assert!(routes < firewalls && firewalls < tunnels);
        assert_eq!(html.matches(NO_DATA).count(), 2);
        assert!(html.contains("<td>&lt;deny&gt;</td>"));
    }
}
