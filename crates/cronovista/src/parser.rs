use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::reader::Reader as XmlReader;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{parse_datetime, ActivityRecord};

/// Errors produced while parsing a SpreadsheetML activity export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("malformed SpreadsheetML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("no data rows found in export")]
    Empty,
    #[error("header row has no recognizable activity columns")]
    MissingHeaders,
}

/// Parse SpreadsheetML export content (the XML flavor produced by
/// "Export to Excel" on activity views) into activity records.
///
/// The first row is treated as headers; rows carrying neither a subject
/// nor a description are dropped.
pub fn parse_export_content(content: &str) -> Result<Vec<ActivityRecord>, ExportError> {
    let rows = parse_spreadsheet_rows(content)?;

    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let columns = map_columns(&rows[0]);
    if !columns.contains_key("subject") && !columns.contains_key("description") {
        return Err(ExportError::MissingHeaders);
    }

    let mut records = Vec::new();
    for row in rows.iter().skip(1) {
        if let Some(record) = parse_row(row, &columns) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Parse SpreadsheetML XML into rows of cell values
fn parse_spreadsheet_rows(xml: &str) -> Result<Vec<Vec<String>>, ExportError> {
    let mut reader = XmlReader::from_str(xml);
    // Don't trim text - we'll trim at cell level to preserve spaces around entities
    reader.config_mut().trim_text(false);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut in_row = false;
    let mut in_cell = false;
    let mut in_data = false;
    let mut cell_had_data = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Row" => {
                    in_row = true;
                    current_row = Vec::new();
                }
                b"Cell" => {
                    if in_row {
                        in_cell = true;
                        cell_had_data = false;
                    }
                }
                b"Data" => {
                    if in_cell {
                        in_data = true;
                        cell_had_data = true;
                        current_text.clear();
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"Row" => {
                    if in_row && !current_row.is_empty() {
                        rows.push(current_row.clone());
                    }
                    in_row = false;
                }
                b"Cell" => {
                    if in_cell && !cell_had_data {
                        // Empty cell keeps its column position
                        current_row.push(String::new());
                    }
                    in_cell = false;
                }
                b"Data" => {
                    if in_data {
                        current_row.push(current_text.trim().to_string());
                        current_text.clear();
                    }
                    in_data = false;
                }
                _ => {}
            },
            Event::Text(e) => {
                if in_data {
                    if let Ok(decoded) = e.decode() {
                        if let Ok(text) = unescape(&decoded) {
                            current_text.push_str(&text);
                        }
                    }
                }
            }
            Event::GeneralRef(e) => {
                // Handle entity references like &amp;
                if in_data {
                    if let Ok(decoded) = e.decode() {
                        let resolved = match decoded.as_ref() {
                            "amp" => "&",
                            "lt" => "<",
                            "gt" => ">",
                            "quot" => "\"",
                            "apos" => "'",
                            _ => "",
                        };
                        current_text.push_str(resolved);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

/// Map header names to column indices. First matching column wins.
fn map_columns(headers: &[String]) -> HashMap<&'static str, usize> {
    let mut columns = HashMap::new();

    for (i, header) in headers.iter().enumerate() {
        let lower = header.to_lowercase();

        if lower.contains("subject") || lower.contains("topic") {
            columns.entry("subject").or_insert(i);
        }

        if lower.contains("description") || lower.contains("details") || lower.contains("note") {
            columns.entry("description").or_insert(i);
        }

        if lower.contains("start") {
            columns.entry("start").or_insert(i);
        }

        if lower.contains("end") || lower.contains("due") {
            columns.entry("end").or_insert(i);
        }

        if lower.contains("status") || lower.contains("state") {
            columns.entry("status").or_insert(i);
        }
    }

    columns
}

/// Parse a single row into an ActivityRecord.
///
/// Rows with neither a subject nor a description are dropped.
fn parse_row(row: &[String], columns: &HashMap<&'static str, usize>) -> Option<ActivityRecord> {
    let get_col = |key: &str| -> String {
        columns
            .get(key)
            .and_then(|&i| row.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let subject = get_col("subject");
    let description = get_col("description");

    // Only include rows with meaningful data
    if subject.is_empty() && description.is_empty() {
        return None;
    }

    let scheduled_start = parse_datetime(&get_col("start"));
    let scheduled_end = parse_datetime(&get_col("end"));
    let status_code = parse_status_code(&get_col("status"));

    Some(ActivityRecord::new(
        (!subject.is_empty()).then_some(subject),
        (!description.is_empty()).then_some(description),
        scheduled_start,
        scheduled_end,
        status_code,
    ))
}

/// Parse a status cell, accepting either the numeric code or its label.
fn parse_status_code(value: &str) -> i64 {
    if let Ok(code) = value.parse::<i64>() {
        return code;
    }

    match value.to_lowercase().as_str() {
        "completed" => 1,
        "in progress" => 2,
        "canceled" | "cancelled" => 3,
        _ => 0,
    }
}
