//! HTTP client for the sticker pack CDN.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::decrypt::decrypt_manifest;
use crate::error::{FetchErrorKind, PackdexError, PackdexResult};
use crate::keys::derive_keys;
use crate::manifest::{decode_manifest, Manifest};
use crate::types::{BundleDescriptor, FetchConfig};
use crate::verify::verify_manifest;

/// User agent for CDN requests.
const USER_AGENT_VALUE: &str = concat!("packdex/", env!("CARGO_PKG_VERSION"));

/// Shortest pause before a retried attempt, in milliseconds.
const RETRY_BACKOFF_MIN_MS: u64 = 250;

/// Longest pause before a retried attempt, in milliseconds.
const RETRY_BACKOFF_MAX_MS: u64 = 500;

/// CDN client for fetching and decrypting sticker pack manifests.
#[derive(Debug, Clone)]
pub struct FetchClient {
    /// HTTP client.
    client: reqwest::Client,

    /// Base URL for the CDN.
    base_url: String,

    /// Configuration.
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new CDN client.
    pub fn new(config: FetchConfig) -> PackdexResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| PackdexError::Internal {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        // Normalize base URL (remove trailing slash)
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> PackdexResult<Self> {
        Self::new(FetchConfig::from_env())
    }

    /// Run the full pipeline for one bundle.
    ///
    /// Fetches the encrypted manifest, derives the bundle's subkeys,
    /// authenticates, decrypts, and decodes. The MAC is always checked
    /// before any decryption happens; only the fetch itself is retried.
    pub async fn fetch_manifest(&self, bundle: &BundleDescriptor) -> PackdexResult<Manifest> {
        let raw = self.fetch_raw(&bundle.id).await?;

        let keys = derive_keys(&bundle.key)?;
        verify_manifest(&raw, &keys.mac_key)?;
        let plaintext = decrypt_manifest(&raw, &keys.cipher_key)?;
        let manifest = decode_manifest(&plaintext)?;

        debug!(
            bundle_id = %bundle.id,
            title = %manifest.title,
            stickers = manifest.stickers.len(),
            "manifest decoded"
        );

        Ok(manifest)
    }

    /// Fetch the raw encrypted manifest bytes, retrying timed-out attempts.
    pub async fn fetch_raw(&self, bundle_id: &str) -> PackdexResult<Vec<u8>> {
        let url = format!("{}/stickers/{}/manifest.proto", self.base_url, bundle_id);
        debug!(url = %url, "fetching raw manifest");

        let mut retries = 0;
        let max_retries = self.config.max_retries;

        loop {
            let result = self.fetch_once(&url, bundle_id).await;

            match result {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = Duration::from_millis(
                        rand::thread_rng().gen_range(RETRY_BACKOFF_MIN_MS..=RETRY_BACKOFF_MAX_MS),
                    );

                    warn!(
                        bundle_id = %bundle_id,
                        error = %e,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying manifest fetch"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Make a single request without retry.
    async fn fetch_once(&self, url: &str, bundle_id: &str) -> PackdexResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PackdexError::Fetch {
                bundle_id: bundle_id.to_string(),
                kind: FetchErrorKind::classify(&e),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PackdexError::Fetch {
                bundle_id: bundle_id.to_string(),
                kind: FetchErrorKind::Status(status.as_u16()),
                message: format!("unexpected status: {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| PackdexError::Fetch {
            bundle_id: bundle_id.to_string(),
            kind: FetchErrorKind::classify(&e),
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(body.to_vec())
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
