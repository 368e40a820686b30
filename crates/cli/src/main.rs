//! clippings command-line entry point.
//!
//! Reads URLs from arguments and/or a file, runs the sequential batch
//! scraper, prints status lines as they arrive, and exports the results to
//! CSV. Logging goes to stderr so status output on stdout stays clean.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clippings_client::{BatchRunner, DelayPolicy, DisabledSessionFactory, FetchClient, FetchConfig, RenderOptions, SessionFactory};
use clippings_core::AppConfig;

mod export;

#[derive(Debug, Parser)]
#[command(name = "clippings", version, about = "Batch article scraper with a rendered-browser fallback")]
struct Cli {
    /// URLs to scrape, in order.
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// File with one URL per line; blank lines and # comments are skipped.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output CSV path. Defaults to a timestamped file in the configured
    /// output directory.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.input {
        urls.extend(read_url_file(path)?);
    }
    if urls.is_empty() {
        bail!("no URLs given; pass them as arguments or via --input");
    }

    let fetch = FetchClient::new(FetchConfig::from_app_config(&config))?;
    let runner = BatchRunner::new(
        Box::new(fetch),
        session_factory(&config),
        RenderOptions::from_app_config(&config),
        DelayPolicy::from_app_config(&config),
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<clippings_client::StatusEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("[{}] {}", event.at.format("%H:%M:%S"), event.message);
        }
    });

    let outcome = runner.run(urls, tx).await?;
    printer.await.ok();

    if outcome.records.is_empty() {
        println!("No articles extracted; nothing to export");
        return Ok(());
    }

    let path = cli
        .output
        .unwrap_or_else(|| export::default_export_path(&config.output_dir));
    export::export_csv(&outcome.records, &path)?;
    println!("Exported {} articles to {}", outcome.records.len(), path.display());

    Ok(())
}

#[cfg(feature = "render")]
fn session_factory(config: &AppConfig) -> Box<dyn SessionFactory> {
    if config.render_enabled {
        Box::new(clippings_client::HeadlessSessionFactory)
    } else {
        Box::new(DisabledSessionFactory)
    }
}

#[cfg(not(feature = "render"))]
fn session_factory(_config: &AppConfig) -> Box<dyn SessionFactory> {
    Box::new(DisabledSessionFactory)
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read URL file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
