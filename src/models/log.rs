//! Log analysis data models
//!
//! Per-request values produced by the extractor and the chunker

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Code used when an error line carries no numeric code
pub const NO_CODE: &str = "N/A";

/// Aggregated error occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Three digit code, or `N/A`
    pub code: String,
    /// Free text description
    pub description: String,
    /// Number of matching lines, at least 1
    pub count: usize,
}

impl ErrorRecord {
    /// Merged key, e.g. `Error 404: Resource not found`
    pub fn key(&self) -> String {
        format!("Error {}: {}", self.code, self.description)
    }
}

/// A timestamped error line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedOccurrence {
    pub error_code: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// Hour bucket -> occurrence count, in first-seen bucket order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBucketHistogram {
    entries: Vec<(String, usize)>,
    /// bucket -> position in `entries`
    index: HashMap<String, usize>,
}

impl TimeBucketHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence to `bucket`
    pub fn increment(&mut self, bucket: &str) {
        self.add(bucket, 1);
    }

    fn add(&mut self, bucket: &str, count: usize) {
        match self.index.get(bucket) {
            Some(&pos) => self.entries[pos].1 += count,
            None => {
                self.index.insert(bucket.to_string(), self.entries.len());
                self.entries.push((bucket.to_string(), count));
            }
        }
    }

    pub fn get(&self, bucket: &str) -> Option<usize> {
        self.index.get(bucket).map(|&pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Bucket with the highest count.
    ///
    /// Ties go to the first maximum in bucket order.
    pub fn peak(&self) -> Option<(&str, usize)> {
        let mut peak: Option<(&str, usize)> = None;
        for (key, count) in self.iter() {
            match peak {
                Some((_, best)) if count <= best => {}
                _ => peak = Some((key, count)),
            }
        }
        peak
    }
}

impl FromIterator<(String, usize)> for TimeBucketHistogram {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        let mut histogram = Self::new();
        for (bucket, count) in iter {
            histogram.add(&bucket, count);
        }
        histogram
    }
}

// Serialized as a JSON object keeping bucket order
impl Serialize for TimeBucketHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Complete output of one extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorAnalysis {
    /// Frequency table in first-seen order
    pub records: Vec<ErrorRecord>,
    /// Lines with both a timestamp and an error marker
    pub total_error_count: usize,
    pub occurrences: Vec<TimestampedOccurrence>,
    pub histogram: TimeBucketHistogram,
    /// Bracketed timestamps that looked valid but did not parse
    pub malformed_timestamps: usize,
}

impl ErrorAnalysis {
    pub fn peak_bucket(&self) -> Option<(&str, usize)> {
        self.histogram.peak()
    }

    /// Sum of all record counts
    pub fn matched_lines(&self) -> usize {
        self.records.iter().map(|r| r.count).sum()
    }

    /// Compact text form, one `"{key} - Count: {n}"` line per record
    pub fn digest(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("{} - Count: {}", r.key(), r.count))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Line-aligned slice of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in emission order, starting at 0
    pub id: usize,
    pub text: String,
    /// Length of `text` in characters
    pub char_length: usize,
    /// Occurrences of the literal `ERROR` in `text`
    pub error_marker_count: usize,
}

impl Chunk {
    pub fn new(id: usize, text: String) -> Self {
        let char_length = text.chars().count();
        let error_marker_count = text.matches("ERROR").count();
        Self {
            id,
            text,
            char_length,
            error_marker_count,
        }
    }
}
