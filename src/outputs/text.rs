//! The output store: classified records as line-oriented text.
//!
//! One record per line, tab-separated:
//!
//! ```text
//! content_hash<TAB>category<TAB>published<TAB>source_label<TAB>title<TAB>link
//! ```
//!
//! `published` is RFC 3339 or `-` when absent. The layout is append-friendly
//! (classify adds new lines, never rewrites old ones) and reads back both as
//! structured records — including the hashes that seed deduplication — and
//! as raw bytes for download. Malformed lines are logged and skipped on
//! read; the deduplication invariant (no two lines share a hash) is upheld
//! by the classify operation, which only appends records whose hash is new.

use crate::errors::PipelineError;
use crate::models::{Category, ClassifiedRecord, NormalizedRecord};
use crate::normalize;
use crate::utils::truncate_for_log;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

const FIELD_COUNT: usize = 6;
const EMPTY_FIELD: &str = "-";

/// Render one record as its output line (no trailing newline).
pub fn render_line(record: &ClassifiedRecord) -> String {
    let published = record
        .record
        .published
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| EMPTY_FIELD.to_string());
    let label = if record.record.source_label.is_empty() {
        EMPTY_FIELD
    } else {
        &record.record.source_label
    };
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        clean_field(&record.record.content_hash),
        record.category,
        published,
        clean_field(label),
        clean_field(&record.record.title),
        clean_field(&record.record.link),
    )
}

/// Parse one output line back into a record. Returns `None` for lines that
/// do not follow the layout.
pub fn parse_line(line: &str) -> Option<ClassifiedRecord> {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, '\t').collect();
    if fields.len() != FIELD_COUNT {
        return None;
    }
    let category = Category::from_name(fields[1])?;
    let published = if fields[2] == EMPTY_FIELD {
        None
    } else {
        normalize::parse_published(fields[2])
    };
    let source_label = if fields[3] == EMPTY_FIELD {
        String::new()
    } else {
        fields[3].to_string()
    };

    Some(ClassifiedRecord {
        record: NormalizedRecord {
            title: fields[4].to_string(),
            summary: String::new(),
            link: fields[5].to_string(),
            published,
            source_label,
            content_hash: fields[0].to_string(),
        },
        category,
    })
}

/// Append records to the output store, creating it (and parent directories)
/// on first use.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn append_records(
    path: &Path,
    records: &[ClassifiedRecord],
) -> Result<(), PipelineError> {
    if records.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::store(path, e))?;
        }
    }

    let mut chunk = String::new();
    for record in records {
        writeln!(chunk, "{}", render_line(record)).unwrap();
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| PipelineError::store(path, e))?;
    file.write_all(chunk.as_bytes())
        .await
        .map_err(|e| PipelineError::store(path, e))?;
    file.flush()
        .await
        .map_err(|e| PipelineError::store(path, e))?;

    info!("Appended to output store");
    Ok(())
}

/// Read all classified records back out. A store that does not exist yet
/// reads as empty; that is the normal first-run state, not a failure.
pub async fn read_records(path: &Path) -> Result<Vec<ClassifiedRecord>, PipelineError> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PipelineError::store(path, e)),
    };

    let mut records = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(record) => records.push(record),
            None => warn!(
                path = %path.display(),
                line = %truncate_for_log(line, 120),
                "Skipping malformed output line"
            ),
        }
    }
    Ok(records)
}

/// The content hashes already present in the output store, for seeding
/// deduplication.
pub async fn read_seen_hashes(path: &Path) -> Result<HashSet<String>, PipelineError> {
    let records = read_records(path).await?;
    Ok(records
        .into_iter()
        .map(|record| record.record.content_hash)
        .collect())
}

/// The raw bytes of the output store, for download. A missing store serves
/// as empty.
pub async fn read_bytes(path: &Path) -> Result<Vec<u8>, PipelineError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(PipelineError::store(path, e)),
    }
}

/// Tabs and newlines would break the line layout; flatten them to spaces.
fn clean_field(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::scratch_dir;
    use chrono::{TimeZone, Utc};

    fn classified(title: &str, hash: &str, category: Category) -> ClassifiedRecord {
        ClassifiedRecord {
            record: NormalizedRecord {
                title: title.to_string(),
                summary: "summary is not persisted in the output store".to_string(),
                link: format!("https://example.com/{hash}"),
                published: Some(Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()),
                source_label: "example".to_string(),
                content_hash: hash.to_string(),
            },
            category,
        }
    }

    #[test]
    fn test_render_parse_round_trip() {
        let record = classified("A tale of tabs", "cafe01", Category::LearningSkills);
        let line = render_line(&record);
        let back = parse_line(&line).unwrap();

        assert_eq!(back.record.content_hash, "cafe01");
        assert_eq!(back.record.title, "A tale of tabs");
        assert_eq!(back.record.link, record.record.link);
        assert_eq!(back.record.published, record.record.published);
        assert_eq!(back.category, Category::LearningSkills);
    }

    #[test]
    fn test_render_flattens_embedded_tabs() {
        let record = classified("tab\there", "beef02", Category::Other);
        let line = render_line(&record);
        let back = parse_line(&line).unwrap();
        assert_eq!(back.record.title, "tab here");
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(parse_line("too\tfew\tfields").is_none());
        assert!(parse_line("h\tNot A Category\t-\ts\ttitle\tlink").is_none());
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let path = scratch_dir("text_append").join("classified_news.tsv");

        append_records(&path, &[classified("first", "aa", Category::Other)])
            .await
            .unwrap();
        append_records(&path, &[classified("second", "bb", Category::ToolsResources)])
            .await
            .unwrap();

        let records = read_records(&path).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record.title, "first");
        assert_eq!(records[1].category, Category::ToolsResources);

        let hashes = read_seen_hashes(&path).await.unwrap();
        assert!(hashes.contains("aa") && hashes.contains("bb"));
    }

    #[tokio::test]
    async fn test_missing_store_reads_as_empty() {
        let path = scratch_dir("text_missing").join("absent.tsv");
        assert!(read_records(&path).await.unwrap().is_empty());
        assert!(read_seen_hashes(&path).await.unwrap().is_empty());
        assert!(read_bytes(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped_not_fatal() {
        let path = scratch_dir("text_malformed").join("classified_news.tsv");
        append_records(&path, &[classified("good", "cc", Category::Other)])
            .await
            .unwrap();

        // corrupt the store by hand
        let mut text = fs::read_to_string(&path).await.unwrap();
        text.push_str("this line is not a record\n");
        fs::write(&path, text).await.unwrap();

        let records = read_records(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.title, "good");
    }

    #[tokio::test]
    async fn test_read_bytes_serves_raw_layout() {
        let path = scratch_dir("text_bytes").join("classified_news.tsv");
        append_records(&path, &[classified("raw", "dd", Category::Other)])
            .await
            .unwrap();

        let bytes = read_bytes(&path).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("dd\tOther\t"));
        assert!(text.ends_with('\n'));
    }
}
