//! Sticker pack manifest pipeline.
//!
//! This crate fetches encrypted sticker pack manifests from a CDN and turns
//! them into a single aggregate document:
//!
//! - HTTP client with timeout-only retry and random backoff
//! - HKDF key derivation from per-bundle master keys
//! - HMAC-SHA256 authentication ahead of AES-256-CBC decryption
//! - Protobuf manifest decoding
//! - Concurrent, staggered batch fetching across a YAML catalog
//!
//! # Quick Start
//!
//! ```no_run
//! use packdex_core::{load_catalog, BatchConfig, BatchFetcher, FetchClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! // Create client from environment
//! let client = FetchClient::from_env()?;
//!
//! // Fetch every bundle in the catalog
//! let bundles = load_catalog("stickers.yml")?;
//! let fetcher = BatchFetcher::new(client, BatchConfig::default());
//! let index = fetcher.run_all(&bundles).await?;
//! println!("fetched {} packs", index.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `PACKDEX_BASE_URL` | CDN base URL (default: `https://cdn-ca.signal.org`) |
//! | `PACKDEX_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `PACKDEX_MAX_RETRIES` | Max retries after timed-out attempts (default: 5) |

pub mod batch;
pub mod catalog;
pub mod client;
mod decrypt;
pub mod error;
mod keys;
pub mod manifest;
pub mod types;
mod verify;

// Re-export main types
pub use batch::BatchFetcher;
pub use catalog::{load_catalog, parse_catalog};
pub use client::FetchClient;
pub use decrypt::decrypt_manifest;
pub use error::{FetchErrorKind, PackdexError, PackdexResult, Stage};
pub use keys::{derive_keys, DerivedKeys};
pub use manifest::{decode_manifest, Manifest, Sticker};
pub use types::{
    BatchConfig, BundleDescriptor, BundleMeta, FetchConfig, ManifestSummary, PackEntry, PackIndex,
};
pub use verify::verify_manifest;
