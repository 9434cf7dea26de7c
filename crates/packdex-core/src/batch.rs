//! Concurrent fetch orchestration across a bundle catalog.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Duration;
use tracing::debug;

use crate::client::FetchClient;
use crate::error::{PackdexError, PackdexResult};
use crate::types::{BatchConfig, BundleDescriptor, PackEntry, PackIndex};

/// Runs the manifest pipeline for a whole catalog.
#[derive(Debug, Clone)]
pub struct BatchFetcher {
    client: FetchClient,
    config: BatchConfig,
}

impl BatchFetcher {
    /// Create a batch fetcher over an existing client.
    pub fn new(client: FetchClient, config: BatchConfig) -> Self {
        Self { client, config }
    }

    /// Fetch every bundle and aggregate the results keyed by bundle id.
    ///
    /// Bundles run concurrently up to the configured cap, each preceded by
    /// a random stagger delay. The batch is all-or-nothing: the first
    /// bundle failure is returned and in-flight fetches are dropped. An
    /// empty catalog returns an empty index without touching the network.
    pub async fn run_all(&self, bundles: &[BundleDescriptor]) -> PackdexResult<PackIndex> {
        if bundles.is_empty() {
            return Ok(PackIndex::new());
        }

        debug!(
            bundles = bundles.len(),
            max_concurrency = self.config.max_concurrency,
            jitter_ms = self.config.jitter_ms,
            "starting batch fetch"
        );

        let sem = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for bundle in bundles {
            let permit =
                sem.clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| PackdexError::Internal {
                        message: format!("semaphore closed: {}", e),
                    })?;
            let client = self.client.clone();
            let bundle = bundle.clone();
            let jitter_ms = self.config.jitter_ms;

            join_set.spawn(async move {
                let _permit = permit;

                if jitter_ms > 0 {
                    let delay = Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms));
                    tokio::time::sleep(delay).await;
                }

                let manifest = client
                    .fetch_manifest(&bundle)
                    .await
                    .map_err(|e| e.into_bundle(&bundle.id))?;

                Ok::<_, PackdexError>((
                    bundle.id.clone(),
                    PackEntry {
                        meta: bundle.meta(),
                        manifest: manifest.summary(),
                    },
                ))
            });
        }

        let mut index = PackIndex::new();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(Ok((id, entry))) => {
                    index.insert(id, entry);
                }
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    return Err(PackdexError::Internal {
                        message: format!("task error: {}", e),
                    });
                }
            }
        }

        debug!(packs = index.len(), "batch fetch complete");
        Ok(index)
    }
}
