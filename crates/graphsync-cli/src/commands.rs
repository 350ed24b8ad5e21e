//! The loader run command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use graphsync_graph::{HttpGraphClient, HttpGraphConfig};
use graphsync_pipeline::Runner;
use graphsync_search::{HttpSearchClient, HttpSearchConfig};
use graphsync_types::{load_index_spec, RunStats, Settings};

use crate::cli::Cli;

/// Load configuration, process every selected index, and write the run
/// reports. Per-index failures end up as `ERROR` rows in the summary and
/// never fail the process; only configuration and spec-loading errors do.
pub async fn run(cli: Cli) -> Result<()> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut settings);

    init_logging(&settings)?;

    info!("graphsync starting");
    info!("Configuration:");
    info!("  Graph URL: {}", settings.graph.url);
    info!("  Search URL: {}", settings.search.url);
    info!("  Verify certs: {}", settings.search.verify_certs);
    info!("  Clear existing indices: {}", settings.clear_existing_indices);
    info!("  Allow index creation: {}", settings.allow_index_creation);
    info!("  Test mode: {}", settings.test_mode);
    info!("  Keep id in source: {}", settings.keep_id_in_source);
    info!("  Report dir: {}", settings.report_dir);

    let spec_path = settings
        .index_spec_file
        .as_deref()
        .context("No index specification file configured (--index-spec-file)")?;
    let spec = load_index_spec(spec_path)
        .with_context(|| format!("Failed to load index specification from {spec_path}"))?;
    info!(
        spec = %spec_path,
        indices = spec.indices.len(),
        "Loaded index specification"
    );

    let graph = build_graph_client(&settings)?;
    let search = build_search_client(&settings)?;

    let mut stats = RunStats::new();
    Runner::new(&graph, &search, &settings)
        .run(&spec, &mut stats)
        .await;

    println!("{}", stats.render_summary());
    println!("{}", stats.render_query_report());
    let (summary_path, query_path) = stats
        .write_reports(Path::new(&settings.report_dir))
        .context("Failed to write run reports")?;
    info!(
        summary = %summary_path.display(),
        query_times = %query_path.display(),
        "Run reports written"
    );
    if stats.has_errors() {
        tracing::warn!("One or more indices failed; see the run summary");
    }
    Ok(())
}

fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn build_graph_client(settings: &Settings) -> Result<HttpGraphClient> {
    let mut config = HttpGraphConfig::new(&settings.graph.url);
    if let (Some(user), Some(password)) = (&settings.graph.username, &settings.graph.password) {
        config = config.with_auth(user, password);
    }
    HttpGraphClient::new(config).context("Failed to build graph client")
}

fn build_search_client(settings: &Settings) -> Result<HttpSearchClient> {
    let mut config =
        HttpSearchConfig::new(&settings.search.url).with_verify_certs(settings.search.verify_certs);
    if let (Some(user), Some(password)) = (&settings.search.username, &settings.search.password) {
        config = config.with_auth(user, password);
    }
    HttpSearchClient::new(config).context("Failed to build search client")
}
