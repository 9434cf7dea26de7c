//! Configuration and data model for the manifest pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// AES-CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// HMAC-SHA256 tag length in bytes.
pub const MAC_LEN: usize = 32;

/// Smallest well-formed raw manifest: an IV and a MAC with nothing between.
pub const MIN_MANIFEST_LEN: usize = IV_LEN + MAC_LEN;

/// One catalog entry: a bundle id, its master key, and any pass-through
/// metadata the catalog carries for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleDescriptor {
    /// Bundle identifier used in the CDN path.
    pub id: String,

    /// Hex-encoded 256-bit master key.
    pub key: String,

    /// Catalog fields echoed into the output untouched.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BundleDescriptor {
    /// Create a descriptor with no extra metadata.
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// The catalog metadata as it appears in the output document.
    pub fn meta(&self) -> BundleMeta {
        BundleMeta {
            id: self.id.clone(),
            key: self.key.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Catalog metadata echoed into the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    /// Bundle identifier.
    pub id: String,

    /// Hex-encoded master key.
    pub key: String,

    /// Pass-through catalog fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Projection of a decoded manifest carried into the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSummary {
    /// Pack title.
    pub title: String,

    /// Pack author.
    pub author: String,

    /// Cover sticker identifier.
    pub cover: u32,
}

/// One aggregate entry: catalog metadata plus the manifest projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackEntry {
    /// Catalog fields for this bundle.
    pub meta: BundleMeta,

    /// Decoded manifest projection.
    pub manifest: ManifestSummary,
}

/// The aggregate document, keyed by bundle id.
///
/// A `BTreeMap` keeps serialization deterministic regardless of the order
/// bundles complete in.
pub type PackIndex = BTreeMap<String, PackEntry>;

/// Fetch client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL for the CDN.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries after a timed-out attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "https://cdn-ca.signal.org".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl FetchConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `PACKDEX_BASE_URL` | CDN base URL |
    /// | `PACKDEX_TIMEOUT` | Request timeout in seconds |
    /// | `PACKDEX_MAX_RETRIES` | Max retries after timed-out attempts |
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PACKDEX_BASE_URL").unwrap_or_else(|_| default_base_url()),
            timeout_secs: std::env::var("PACKDEX_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("PACKDEX_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Batch orchestration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum concurrent bundle pipelines.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Upper bound of the random pre-fetch delay in milliseconds.
    /// Zero disables staggering.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

fn default_max_concurrency() -> usize {
    16
}

fn default_jitter_ms() -> u64 {
    1000
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl BatchConfig {
    /// Set the concurrency cap.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Set the pre-fetch jitter upper bound.
    pub fn with_jitter_ms(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }
}
