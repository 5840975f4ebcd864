//! The pipeline orchestrator.
//!
//! Sequences the stages behind three independently callable operations:
//!
//! - [`Pipeline::scrape`]: fetch + normalize, overwrite the intermediate store
//! - [`Pipeline::process`]: re-normalize the intermediate store in place
//! - [`Pipeline::classify`]: dedupe + classify, append to the output store
//!
//! plus [`Pipeline::view_output`] and [`Pipeline::download_output`] for
//! consumers of the output store.
//!
//! # Store ownership
//!
//! The orchestrator owns both stores for the duration of one invocation.
//! Each store has its own lock: `scrape` and `process` contend for the
//! intermediate store, `classify` for the output store. A conflicting
//! concurrent call is rejected with `PipelineBusy` rather than queued, so
//! callers always get an immediate answer.
//!
//! Crash consistency is intentionally modest: a process killed mid-write can
//! leave a partially written store. Nothing rolls back across invocations;
//! the next successful `scrape` rewrites the intermediate store wholesale,
//! and malformed output lines are skipped on read.

use crate::classify;
use crate::config::PipelineConfig;
use crate::dedupe;
use crate::errors::PipelineError;
use crate::models::{ClassifiedRecord, SourceDescriptor};
use crate::normalize;
use crate::outputs;
use crate::scrapers;
use crate::sources;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{info, instrument};

pub struct Pipeline {
    config: PipelineConfig,
    /// Serializes writers of the intermediate store (`scrape`, `process`).
    intermediate_lock: Mutex<()>,
    /// Serializes writers of the output store (`classify`).
    output_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            intermediate_lock: Mutex::new(()),
            output_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch every source, normalize the results, and overwrite the
    /// intermediate store. Returns the number of records written.
    ///
    /// Partial success is success: a failing source is skipped. Only when
    /// every source fails does this surface `SourceUnavailable`, and the
    /// intermediate store is left untouched in that case.
    #[instrument(level = "info", skip_all, fields(extra = extra_sources.len()))]
    pub async fn scrape(
        &self,
        extra_sources: Vec<SourceDescriptor>,
    ) -> Result<usize, PipelineError> {
        let _guard = self
            .intermediate_lock
            .try_lock()
            .map_err(|_| PipelineError::PipelineBusy { stage: "scrape" })?;

        let resolved = sources::resolve_sources(&self.config.sources, extra_sources);
        info!(count = resolved.len(), "Resolved source registry");

        let client = scrapers::build_client(&self.config)?;
        let outcomes = scrapers::fetch(&client, resolved, &self.config).await;
        let raw_items = scrapers::merge_outcomes(outcomes)?;
        info!(count = raw_items.len(), "Fetched raw items");

        let records = normalize::normalize(raw_items);
        outputs::json::write_records(&self.config.intermediate_path, &records).await?;
        info!(count = records.len(), "Scrape complete");
        Ok(records.len())
    }

    /// Re-run normalization over the intermediate store. A no-op on already
    /// normalized data; exists as a seam for re-cleaning without re-fetching.
    /// Returns the record count.
    #[instrument(level = "info", skip_all)]
    pub async fn process(&self, input: Option<&Path>) -> Result<usize, PipelineError> {
        let _guard = self
            .intermediate_lock
            .try_lock()
            .map_err(|_| PipelineError::PipelineBusy { stage: "process" })?;

        let path = input.unwrap_or(&self.config.intermediate_path);
        let records = outputs::json::read_records(path).await?;
        let records = normalize::renormalize(records);
        outputs::json::write_records(path, &records).await?;
        info!(count = records.len(), "Process complete");
        Ok(records.len())
    }

    /// Classify everything in the intermediate store that the output store
    /// has not seen yet, and append the results. Returns the number of newly
    /// classified records — 0 when nothing new arrived, which makes repeated
    /// runs over unchanged input harmless.
    #[instrument(level = "info", skip_all)]
    pub async fn classify(
        &self,
        input: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<usize, PipelineError> {
        let _guard = self
            .output_lock
            .try_lock()
            .map_err(|_| PipelineError::PipelineBusy { stage: "classify" })?;

        let input = input.unwrap_or(&self.config.intermediate_path);
        let output = output.unwrap_or(&self.config.output_path);

        let records = outputs::json::read_records(input).await?;
        let seen = outputs::text::read_seen_hashes(output).await?;
        info!(
            candidates = records.len(),
            already_seen = seen.len(),
            "Classifying new records"
        );

        let (fresh, _seen) = dedupe::dedupe(records, seen);
        let classified: Vec<ClassifiedRecord> = fresh
            .into_iter()
            .map(|record| {
                let category = classify::classify(&record);
                ClassifiedRecord { record, category }
            })
            .collect();

        outputs::text::append_records(output, &classified).await?;
        info!(count = classified.len(), "Classify complete");
        Ok(classified.len())
    }

    /// All classified records currently in the output store.
    pub async fn view_output(&self) -> Result<Vec<ClassifiedRecord>, PipelineError> {
        outputs::text::read_records(&self.config.output_path).await
    }

    /// The raw bytes of the output store, for download.
    pub async fn download_output(&self) -> Result<Vec<u8>, PipelineError> {
        outputs::text::read_bytes(&self.config.output_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NormalizedRecord, RawItem};
    use crate::utils::scratch_dir;
    use std::time::Duration;

    fn test_config(name: &str) -> PipelineConfig {
        let dir = scratch_dir(name);
        PipelineConfig {
            sources: Vec::new(),
            intermediate_path: dir.join("normalized_items.json"),
            output_path: dir.join("classified_news.tsv"),
            fetch_timeout: Duration::from_secs(1),
            fetch_concurrency: 2,
            max_items_per_source: 10,
            max_age_days: None,
        }
    }

    fn normalized(title: &str, summary: &str, link: &str) -> NormalizedRecord {
        let raw = RawItem {
            source: SourceDescriptor::labeled("https://feeda.example", "feedA"),
            title: title.to_string(),
            summary: summary.to_string(),
            link: link.to_string(),
            published: None,
        };
        normalize::normalize_item(raw).unwrap()
    }

    async fn seed_intermediate(config: &PipelineConfig, records: &[NormalizedRecord]) {
        outputs::json::write_records(&config.intermediate_path, records)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_classify_appends_then_second_run_appends_nothing() {
        let config = test_config("pipeline_idempotent");
        let pipeline = Pipeline::new(config);
        seed_intermediate(
            pipeline.config(),
            &[
                normalized("Machine learning digest", "weekly notes", "https://x/1"),
                normalized("Unrelated piece", "nothing to match", "https://x/2"),
            ],
        )
        .await;

        let first = pipeline.classify(None, None).await.unwrap();
        assert_eq!(first, 2);

        // unchanged intermediate store: everything is already in the output
        let second = pipeline.classify(None, None).await.unwrap();
        assert_eq!(second, 0);

        let records = pipeline.view_output().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_classify_skips_duplicates_across_sources() {
        let config = test_config("pipeline_dedupe");
        let pipeline = Pipeline::new(config);

        let mut from_a = normalized("Same story", "seen twice", "https://x/same");
        from_a.source_label = "feedA".to_string();
        let mut from_b = from_a.clone();
        from_b.source_label = "feedB".to_string();

        seed_intermediate(pipeline.config(), &[from_a, from_b]).await;

        let appended = pipeline.classify(None, None).await.unwrap();
        assert_eq!(appended, 1);

        let records = pipeline.view_output().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.source_label, "feedA");
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_single_feed_entry() {
        let config = test_config("pipeline_scenario");
        let pipeline = Pipeline::new(config);

        let raw = RawItem {
            source: SourceDescriptor::labeled("https://feeda.example", "feedA"),
            title: "New Rust Async Runtime Released".to_string(),
            summary: "<p>A runtime focused on machine learning workloads.</p>".to_string(),
            link: "https://x/1".to_string(),
            published: Some("2025-05-06T09:00:00Z".to_string()),
        };
        let records = normalize::normalize(vec![raw]);
        seed_intermediate(pipeline.config(), &records).await;

        let appended = pipeline.classify(None, None).await.unwrap();
        assert_eq!(appended, 1);

        let viewed = pipeline.view_output().await.unwrap();
        assert_eq!(viewed.len(), 1);
        assert_eq!(viewed[0].record.title, "New Rust Async Runtime Released");
        assert_eq!(viewed[0].record.link, "https://x/1");
        assert_eq!(viewed[0].category, Category::LearningSkills);

        let bytes = pipeline.download_output().await.unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_process_is_idempotent_and_counts() {
        let config = test_config("pipeline_process");
        let pipeline = Pipeline::new(config);
        seed_intermediate(
            pipeline.config(),
            &[normalized("A title", "a summary", "https://x/1")],
        )
        .await;

        let first = pipeline.process(None).await.unwrap();
        assert_eq!(first, 1);
        let before = outputs::json::read_records(&pipeline.config().intermediate_path)
            .await
            .unwrap();

        let second = pipeline.process(None).await.unwrap();
        assert_eq!(second, 1);
        let after = outputs::json::read_records(&pipeline.config().intermediate_path)
            .await
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_scrape_total_failure_leaves_intermediate_store_untouched() {
        let mut config = test_config("pipeline_total_failure");
        // nothing listens on these ports; both sources fail fast
        config.sources = vec![
            SourceDescriptor::new("http://127.0.0.1:9/"),
            SourceDescriptor::new("http://127.0.0.1:1/"),
        ];
        let pipeline = Pipeline::new(config);

        let existing = vec![normalized("Pre-existing", "kept", "https://x/old")];
        seed_intermediate(pipeline.config(), &existing).await;

        let result = pipeline.scrape(Vec::new()).await;
        assert!(matches!(
            result,
            Err(PipelineError::SourceUnavailable { attempted: 2 })
        ));

        let untouched = outputs::json::read_records(&pipeline.config().intermediate_path)
            .await
            .unwrap();
        assert_eq!(untouched, existing);
    }

    #[tokio::test]
    async fn test_classify_without_intermediate_store_is_store_unavailable() {
        let config = test_config("pipeline_no_input");
        let pipeline = Pipeline::new(config);
        assert!(matches!(
            pipeline.classify(None, None).await,
            Err(PipelineError::StoreUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_classify_is_rejected_busy() {
        let config = test_config("pipeline_busy");
        let pipeline = Pipeline::new(config);

        let guard = pipeline.output_lock.try_lock().unwrap();
        let result = pipeline.classify(None, None).await;
        assert!(matches!(
            result,
            Err(PipelineError::PipelineBusy { stage: "classify" })
        ));
        drop(guard);
    }

    #[tokio::test]
    async fn test_view_output_empty_before_first_classify() {
        let config = test_config("pipeline_view_empty");
        let pipeline = Pipeline::new(config);
        assert!(pipeline.view_output().await.unwrap().is_empty());
        assert!(pipeline.download_output().await.unwrap().is_empty());
    }
}
