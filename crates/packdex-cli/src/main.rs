use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use packdex_core::{
    load_catalog, BatchConfig, BatchFetcher, FetchClient, FetchConfig, PackdexError,
};

#[derive(Parser)]
#[command(
    name = "packdex",
    version,
    about = "Fetch, authenticate, and decrypt sticker pack manifests into one JSON index"
)]
struct Cli {
    /// Catalog file mapping bundle ids to master keys
    #[arg(long, default_value = "stickers.yml")]
    catalog: PathBuf,

    /// Output file for the aggregated JSON document
    #[arg(long, short = 'o', default_value = "sticker-data.json")]
    output: PathBuf,

    /// CDN base URL (overrides PACKDEX_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides PACKDEX_TIMEOUT)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Max retries after timed-out attempts (overrides PACKDEX_MAX_RETRIES)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Maximum concurrent bundle fetches
    #[arg(long)]
    concurrency: Option<usize>,

    /// Upper bound of the random pre-fetch delay in milliseconds, 0 disables
    #[arg(long)]
    jitter_ms: Option<u64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("fatal: {e:#}");
            e.downcast_ref::<PackdexError>()
                .map_or(2, PackdexError::exit_code)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let bundles = load_catalog(&cli.catalog)
        .with_context(|| format!("failed to load catalog {}", cli.catalog.display()))?;

    let mut fetch_config = FetchConfig::from_env();
    if let Some(base_url) = cli.base_url {
        fetch_config = fetch_config.with_base_url(base_url);
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        fetch_config = fetch_config.with_timeout_secs(timeout_secs);
    }
    if let Some(max_retries) = cli.max_retries {
        fetch_config = fetch_config.with_max_retries(max_retries);
    }

    let mut batch_config = BatchConfig::default();
    if let Some(concurrency) = cli.concurrency {
        batch_config = batch_config.with_max_concurrency(concurrency);
    }
    if let Some(jitter_ms) = cli.jitter_ms {
        batch_config = batch_config.with_jitter_ms(jitter_ms);
    }

    let client = FetchClient::new(fetch_config)?;
    let fetcher = BatchFetcher::new(client, batch_config);
    let index = fetcher.run_all(&bundles).await?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&index)
    } else {
        serde_json::to_string(&index)
    }
    .context("failed to serialize sticker index")?;

    std::fs::write(&cli.output, json)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    tracing::info!(
        packs = index.len(),
        output = %cli.output.display(),
        "wrote sticker index"
    );

    Ok(())
}
