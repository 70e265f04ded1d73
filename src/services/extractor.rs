//! Error extraction
//!
//! Scans a log document line by line for `ERROR [code]: description`
//! occurrences, aggregates them into a frequency table, and buckets
//! timestamped errors by hour.

use crate::models::log::{ErrorAnalysis, ErrorRecord, TimestampedOccurrence, NO_CODE};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Severity keyword, optional 3 digit code, optional colon, description to end of line
static ERROR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ERROR\s+(\d{3})?:?\s*(.+)").expect("valid error pattern"));

/// Error marker used for timestamp accounting
static ERROR_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ERROR\s+(\d{3})?").expect("valid error marker pattern"));

/// Bracketed `[YYYY-MM-DD HH:MM:SS]` token
static TIMESTAMP_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]").expect("valid timestamp pattern")
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HOUR_BUCKET_FORMAT: &str = "%Y-%m-%d %H:00:00";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("malformed timestamp '{token}': {source}")]
    MalformedTimestamp {
        token: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Extract the frequency table and timestamp histogram from `document`.
///
/// Deterministic and side-effect free apart from logging.
pub fn extract(document: &str) -> ErrorAnalysis {
    let mut analysis = ErrorAnalysis::default();
    // (code, description) -> position in `analysis.records`
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for (line_no, line) in document.lines().enumerate() {
        let normalized = normalize_line(line);

        if let Some((code, description)) = match_error(&normalized) {
            record_error(&mut analysis.records, &mut index, code, description);
        }

        let Some(marker) = ERROR_MARKER.captures(&normalized) else {
            continue;
        };

        let Some(token) = TIMESTAMP_TOKEN.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };

        match parse_timestamp(token.as_str()) {
            Ok(timestamp) => {
                let bucket = timestamp.format(HOUR_BUCKET_FORMAT).to_string();
                analysis.histogram.increment(&bucket);
                analysis.total_error_count += 1;
                analysis.occurrences.push(TimestampedOccurrence {
                    error_code: marker.get(1).map(|m| m.as_str().to_string()),
                    timestamp,
                });
            }
            Err(e) => {
                warn!("Skipping timestamp on line {}: {}", line_no + 1, e);
                analysis.malformed_timestamps += 1;
            }
        }
    }

    debug!(
        "Extracted {} distinct errors, {} timestamped occurrences in {} buckets",
        analysis.records.len(),
        analysis.total_error_count,
        analysis.histogram.len()
    );

    analysis
}

/// Match one raw line against the error grammar.
///
/// Returns `(code, description)`, with `N/A` when the code is absent.
pub fn match_error_line(line: &str) -> Option<(String, String)> {
    match_error(&normalize_line(line)).map(|(code, desc)| (code.to_string(), desc.to_string()))
}

/// Parse a bracket-stripped timestamp token
pub fn parse_timestamp(token: &str) -> Result<NaiveDateTime, ExtractError> {
    NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).map_err(|source| {
        ExtractError::MalformedTimestamp {
            token: token.to_string(),
            source,
        }
    })
}

fn normalize_line(line: &str) -> String {
    line.replace(':', " ").trim().to_string()
}

fn match_error(normalized: &str) -> Option<(&str, &str)> {
    let captures = ERROR_PATTERN.captures(normalized)?;
    let code = captures.get(1).map_or(NO_CODE, |m| m.as_str());
    let description = captures.get(2)?.as_str().trim();

    if description.is_empty() {
        return None;
    }

    Some((code, description))
}

fn record_error(
    records: &mut Vec<ErrorRecord>,
    index: &mut HashMap<(String, String), usize>,
    code: &str,
    description: &str,
) {
    match index.entry((code.to_string(), description.to_string())) {
        Entry::Occupied(entry) => records[*entry.get()].count += 1,
        Entry::Vacant(entry) => {
            entry.insert(records.len());
            records.push(ErrorRecord {
                code: code.to_string(),
                description: description.to_string(),
                count: 1,
            });
        }
    }
}
