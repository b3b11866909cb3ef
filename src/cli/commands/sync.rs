//! The collection-wide lyrics run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Runtime;
use tracing::info;

use super::SyncArgs;
use crate::config::{self, Config, Overrides};
use crate::fetcher::{FetchOptions, LyricsFetcher, RunSummary};
use crate::musicbrainz::MusicBrainzClient;
use crate::providers::{Genie, Provider, ProviderKind, QqMusic, Vibe};
use crate::report::{self, MissingReport};

/// Fetch lyrics for every audio file below the collection path.
pub fn cmd_sync(rt: &Runtime, args: &SyncArgs) -> anyhow::Result<()> {
    let config = config::load().with_overrides(Overrides {
        registry_url: args.registry_url.clone(),
        rate_limit: args.rate_limit,
        concurrency: args.concurrency,
        provider: args.provider,
    });
    config.validate()?;

    let root = config::resolve_collection(&args.collection_path)?;
    let report_path = args
        .report
        .as_deref()
        .map(config::resolve_report_path)
        .transpose()?;

    let options = FetchOptions {
        check_artist: args.check_artist,
        dry_run: args.dry_run,
        upgrade: args.upgrade,
        force: args.force,
        skip_instrumentals: args.skip_instrumentals,
        concurrency: config.fetch.concurrency,
    };

    rt.block_on(sync(&config, options, root, report_path.as_deref()))
}

async fn sync(
    config: &Config,
    options: FetchOptions,
    root: PathBuf,
    report_path: Option<&Path>,
) -> anyhow::Result<()> {
    let timeout = config.fetch.timeout();
    let registry = Arc::new(MusicBrainzClient::new(
        config.registry.base_url.clone(),
        config.registry.interval()?,
        timeout,
    )?);
    let report = Arc::new(MissingReport::new());

    let kind = config.fetch.provider_kind()?;
    info!(provider = %kind, registry = registry.base_url(), "Syncing {}", root.display());
    let started = Instant::now();

    let summary = match kind {
        ProviderKind::Genie => run(Genie::new(timeout)?, registry, &report, options, root).await,
        ProviderKind::QqMusic => run(QqMusic::new(timeout)?, registry, &report, options, root).await,
        ProviderKind::Vibe => run(Vibe::new(timeout)?, registry, &report, options, root).await,
    };

    println!(
        "\nDone in {:.1}s: {}",
        started.elapsed().as_secs_f64(),
        summary
    );

    if let Some(path) = report_path {
        report::html::write(&report, path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

async fn run<P: Provider>(
    provider: P,
    registry: Arc<MusicBrainzClient>,
    report: &Arc<MissingReport>,
    options: FetchOptions,
    root: PathBuf,
) -> RunSummary {
    let fetcher = Arc::new(LyricsFetcher::new(
        Arc::new(provider),
        registry,
        Arc::clone(report),
        options,
    ));
    fetcher.run(root).await
}
