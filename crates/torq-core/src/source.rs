//! Transfer source classification and magnet URI inspection.
//!
//! A source string is either a magnet-style URI or a path to a local
//! descriptor file. A job may effectively carry both (a magnet that was
//! later materialized as a descriptor); the descriptor wins when the file
//! exists on disk.

use std::path::Path;

use url::Url;

/// What kind of source a job string refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// magnet:-style URI resolved through the swarm.
    Magnet,
    /// Path to a local descriptor file.
    Descriptor,
}

/// Classifies a source string. Anything that is not a magnet URI is treated
/// as a descriptor path; existence on disk is checked at start time, not here.
pub fn classify(source: &str) -> SourceKind {
    if source.starts_with("magnet:") {
        SourceKind::Magnet
    } else {
        SourceKind::Descriptor
    }
}

/// True when the source refers to a descriptor file present on disk.
pub fn descriptor_exists(source: &str) -> bool {
    classify(source) == SourceKind::Descriptor && Path::new(source).is_file()
}

/// Extracts the btih info hash from a magnet URI's `xt` parameter,
/// lowercased. Returns `None` for non-magnet sources or malformed URIs.
pub fn magnet_info_hash(source: &str) -> Option<String> {
    let url = Url::parse(source).ok()?;
    if url.scheme() != "magnet" {
        return None;
    }
    url.query_pairs()
        .filter(|(k, _)| k == "xt")
        .find_map(|(_, v)| {
            v.strip_prefix("urn:btih:")
                .map(|hash| hash.to_ascii_lowercase())
        })
}

/// Extracts the display name (`dn` parameter) from a magnet URI. Used as the
/// initial job name when the caller supplies none.
pub fn magnet_display_name(source: &str) -> Option<String> {
    let url = Url::parse(source).ok()?;
    if url.scheme() != "magnet" {
        return None;
    }
    url.query_pairs()
        .find(|(k, _)| k == "dn")
        .map(|(_, v)| v.into_owned())
        .filter(|name| !name.is_empty())
}

/// Picks a display name for a new job: caller-supplied, else the magnet `dn`,
/// else the descriptor file stem, else the raw source string.
pub fn initial_name(source: &str, requested: Option<&str>) -> String {
    if let Some(name) = requested {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if let Some(dn) = magnet_display_name(source) {
        return dn;
    }
    if classify(source) == SourceKind::Descriptor {
        if let Some(stem) = Path::new(source).file_stem().and_then(|s| s.to_str()) {
            return stem.to_string();
        }
    }
    source.to_string()
}
