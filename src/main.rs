//! # Edu Text News
//!
//! A technology-news aggregation pipeline that scrapes items from RSS/Atom
//! feeds (falling back to plain HTML scraping), normalizes and deduplicates
//! them across sources and across runs, classifies each item into a fixed
//! set of study-oriented categories, and persists the results for viewing
//! and download.
//!
//! ## Usage
//!
//! ```sh
//! edu_text_news scrape
//! edu_text_news classify
//! edu_text_news view
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Scrape**: Fetch raw items per source (feeds first, pages as fallback)
//!    and normalize them into the intermediate store
//! 2. **Process**: Re-run normalization over the intermediate store
//! 3. **Classify**: Deduplicate against the output store, assign categories
//!    with ordered keyword rules, and append the new records
//!
//! Each stage is independently invocable from the CLI and idempotent with
//! respect to its inputs.

use clap::Parser;
use std::error::Error;
use std::io::Write;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod classify;
mod cli;
mod config;
mod dedupe;
mod errors;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod scrapers;
mod sources;
mod utils;

use cli::{Cli, Command};
use config::PipelineConfig;
use models::SourceDescriptor;
use pipeline::Pipeline;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("edu_text_news starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, "Parsed CLI arguments");

    let config = PipelineConfig::load(args.config.as_deref())?;
    info!(
        sources = config.sources.len(),
        intermediate = %config.intermediate_path.display(),
        output = %config.output_path.display(),
        "Configuration ready"
    );

    // Early check: both store directories must be writable
    for path in [&config.intermediate_path, &config.output_path] {
        if let Some(parent) = path.parent() {
            if parent.as_os_str().is_empty() {
                continue;
            }
            if let Err(e) = ensure_writable_dir(parent).await {
                error!(
                    path = %parent.display(),
                    error = %e,
                    "Store directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }
        }
    }

    let pipeline = Pipeline::new(config);

    if let Err(e) = dispatch(&pipeline, args.command).await {
        error!(error = %e, "Pipeline operation failed");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Run one CLI command against the pipeline. Counts go to stdout so the
/// binary composes in scripts; everything else goes through tracing.
async fn dispatch(pipeline: &Pipeline, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Scrape { extra_sites } => {
            let count = pipeline.scrape(to_descriptors(extra_sites)).await?;
            info!(count, "Scrape finished");
            println!("{count}");
        }
        Command::Process { input } => {
            let count = pipeline.process(input.as_deref()).await?;
            info!(count, "Process finished");
            println!("{count}");
        }
        Command::Classify { input, output } => {
            let count = pipeline
                .classify(input.as_deref(), output.as_deref())
                .await?;
            info!(count, "Classify finished");
            println!("{count}");
        }
        Command::Run { extra_sites } => {
            let scraped = pipeline.scrape(to_descriptors(extra_sites)).await?;
            let processed = pipeline.process(None).await?;
            let classified = pipeline.classify(None, None).await?;
            info!(scraped, processed, classified, "Full pipeline finished");
            println!("{classified}");
        }
        Command::View { raw } => {
            if raw {
                let bytes = pipeline.download_output().await?;
                std::io::stdout().write_all(&bytes)?;
            } else {
                let records = pipeline.view_output().await?;
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        }
    }
    Ok(())
}

fn to_descriptors(urls: Vec<String>) -> Vec<SourceDescriptor> {
    urls.into_iter().map(SourceDescriptor::new).collect()
}
