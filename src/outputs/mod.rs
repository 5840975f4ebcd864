//! Persistence for the two pipeline stores.
//!
//! # Submodules
//!
//! - [`json`]: the intermediate store — a JSON array of normalized records,
//!   fully overwritten by each scrape
//! - [`text`]: the output store — line-oriented classified records, appended
//!   to across runs
//!
//! # Store layout
//!
//! ```text
//! data/
//! └── normalized_items.json   # intermediate store (latest scrape only)
//!
//! output/
//! └── classified_news.tsv     # output store (grows across runs)
//! ```

pub mod json;
pub mod text;
