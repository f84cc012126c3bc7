//! Helpers for the resource reference strings found in provider records
//!
//! Provider records point at each other with self links such as
//! `https://www.googleapis.com/compute/v1/projects/p1/global/networks/vpc-a`.
//! Records loaded back from a snapshot use the bare name instead. Both forms
//! are handled by matching on the last path segment.

use std::collections::BTreeMap;

/// Outcome of matching a reference against a map of known names
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a, V> {
    /// The name the reference points at and the value stored for it
    Resolved(&'a str, &'a V),
    Unresolved,
}

impl<'a, V> Resolution<'a, V> {
    pub fn resolved(self) -> Option<(&'a str, &'a V)> {
        match self {
            Resolution::Resolved(name, value) => Some((name, value)),
            Resolution::Unresolved => None,
        }
    }
}

/// Last path segment of a reference, the reference itself when it has no `/`
pub fn short_name(reference: &str) -> &str {
    reference
        .rsplit_once('/')
        .map_or(reference, |(_, name)| name)
}

/// True when `reference` is `name` or ends with `/name`
pub fn matches_suffix(reference: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    match reference.strip_suffix(name) {
        Some("") => true,
        Some(head) => head.ends_with('/'),
        None => false,
    }
}

/// Find the known name a reference points at
pub fn resolve<'a, V>(reference: &str, known: &'a BTreeMap<String, V>) -> Resolution<'a, V> {
    match known.get_key_value(short_name(reference)) {
        Some((name, value)) if matches_suffix(reference, name) => Resolution::Resolved(name, value),
        _ => Resolution::Unresolved,
    }
}

/// Project id embedded in a self link, the segment following `projects`
pub fn project_from_link(link: &str) -> Option<&str> {
    let mut segments = link.split('/');
    segments.find(|segment| *segment == "projects")?;
    segments.next().filter(|project| !project.is_empty())
}

/// Region of a zone, `us-central1-a` is in `us-central1`
pub fn region_from_zone(zone: &str) -> &str {
    let zone = short_name(zone);
    zone.rsplit_once('-').map_or(zone, |(region, _)| region)
}
