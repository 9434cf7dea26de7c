//! Bundle catalog loading.
//!
//! The catalog is a YAML mapping from bundle id to at least a `key` field.
//! Any further fields are carried through into the output document
//! unchanged.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{PackdexError, PackdexResult};
use crate::types::BundleDescriptor;

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    key: String,

    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Parse catalog YAML into bundle descriptors, sorted by bundle id.
///
/// An empty document is a valid catalog with no bundles.
pub fn parse_catalog(text: &str) -> PackdexResult<Vec<BundleDescriptor>> {
    let entries: Option<BTreeMap<String, CatalogEntry>> =
        serde_yaml::from_str(text).map_err(|e| PackdexError::Catalog {
            message: format!("invalid catalog YAML: {}", e),
        })?;

    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|(id, entry)| BundleDescriptor {
            id,
            key: entry.key,
            extra: entry.extra,
        })
        .collect())
}

/// Load and parse a catalog file.
pub fn load_catalog(path: impl AsRef<Path>) -> PackdexResult<Vec<BundleDescriptor>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| PackdexError::Catalog {
        message: format!("failed to read {}: {}", path.display(), e),
    })?;

    let bundles = parse_catalog(&text)?;
    debug!(path = %path.display(), bundles = bundles.len(), "catalog loaded");
    Ok(bundles)
}
