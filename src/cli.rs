//! Command-line interface definitions for Edu Text News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Each subcommand maps to one independently triggerable pipeline operation;
//! every one of them is safely callable with no arguments and falls back to
//! the configured defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Edu Text News application.
///
/// # Examples
///
/// ```sh
/// # Scrape the built-in sources plus one extra feed
/// edu_text_news scrape --extra-site https://blog.rust-lang.org
///
/// # Classify whatever the last scrape produced
/// edu_text_news classify
///
/// # Full pipeline with a config file
/// edu_text_news -c config.yaml run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "EDU_TEXT_NEWS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch and normalize items from every source, overwriting the
    /// intermediate store
    Scrape {
        /// Additional site or feed URLs scraped alongside the built-in list
        #[arg(short = 's', long = "extra-site", value_name = "URL")]
        extra_sites: Vec<String>,
    },

    /// Re-run normalization over the intermediate store without re-fetching
    Process {
        /// Intermediate store to process instead of the configured default
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Deduplicate and classify new records, appending them to the output
    /// store
    Classify {
        /// Intermediate store to read instead of the configured default
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output store to append to instead of the configured default
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scrape, process, and classify in sequence
    Run {
        /// Additional site or feed URLs scraped alongside the built-in list
        #[arg(short = 's', long = "extra-site", value_name = "URL")]
        extra_sites: Vec<String>,
    },

    /// Print the classified records in the output store
    View {
        /// Dump the raw output store bytes instead of JSON
        #[arg(long)]
        raw: bool,
    },
}
