//! The intermediate store: normalized records between scrape and classify.
//!
//! A JSON array of [`NormalizedRecord`] objects. Each `scrape` fully
//! overwrites the file, so the store always reflects only the latest run.

use crate::errors::PipelineError;
use crate::models::NormalizedRecord;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Overwrite the intermediate store with the given records, creating parent
/// directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records(
    path: &Path,
    records: &[NormalizedRecord],
) -> Result<(), PipelineError> {
    let json =
        serde_json::to_string_pretty(records).map_err(|e| PipelineError::store(path, e))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::store(path, e))?;
        }
    }

    fs::write(path, json)
        .await
        .map_err(|e| PipelineError::store(path, e))?;
    info!("Wrote intermediate store");
    Ok(())
}

/// Read the intermediate store back. A missing or unparseable file is a
/// `StoreUnavailable` failure — classify and process need real input.
pub async fn read_records(path: &Path) -> Result<Vec<NormalizedRecord>, PipelineError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::store(path, e))?;
    serde_json::from_str(&text).map_err(|e| PipelineError::store(path, e))
}
