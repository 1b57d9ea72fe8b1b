use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::parser;
use crate::types::ActivityRecord;

/// Load activity records from a dataset file.
///
/// Two formats are accepted: a JSON array of records, or a SpreadsheetML
/// activity export. The format is sniffed from the content so the file
/// extension does not matter.
pub fn load_activities(path: &Path) -> Result<Vec<ActivityRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let records = parse_dataset(&content)
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

    debug!(count = records.len(), path = %path.display(), "Loaded activity records");
    Ok(records)
}

/// Load a dataset, falling back to an empty record list when the file is
/// missing or unreadable. The timeline then shows its empty placeholder
/// until a usable dataset appears.
pub fn load_or_empty(path: &Path) -> Vec<ActivityRecord> {
    if !path.exists() {
        warn!(path = %path.display(), "Dataset not found, starting empty");
        return Vec::new();
    }

    match load_activities(path) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load dataset, starting empty");
            Vec::new()
        }
    }
}

/// Dispatch on the dataset format.
fn parse_dataset(content: &str) -> Result<Vec<ActivityRecord>> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with("<?xml") || trimmed.contains("<Workbook") {
        let records =
            parser::parse_export_content(trimmed).context("Failed to parse activity export")?;
        return Ok(records);
    }

    if trimmed.starts_with('[') {
        let records: Vec<ActivityRecord> =
            serde_json::from_str(trimmed).context("Failed to parse JSON dataset")?;
        return Ok(records);
    }

    anyhow::bail!("Unrecognized dataset format (expected a JSON array or a SpreadsheetML export)")
}
