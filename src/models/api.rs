//! HTTP API data models
//!
//! JSON request and response bodies exposed by the handlers

use crate::models::log::{ErrorAnalysis, TimeBucketHistogram};
use serde::{Deserialize, Serialize};

/// One row of the error frequency table
#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummaryEntry {
    #[serde(rename = "Type & Description")]
    pub type_and_description: String,
    #[serde(rename = "Count")]
    pub count: usize,
}

/// Time concentration of timestamped errors
#[derive(Debug, Clone, Serialize)]
pub struct TimestampInsights {
    pub total_errors: usize,
    pub peak_time: String,
    pub peak_errors: usize,
    pub time_concentration: TimeBucketHistogram,
}

/// Response of the basic analysis endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BasicAnalysisResponse {
    #[serde(rename = "Error Summary")]
    pub error_summary: Vec<ErrorSummaryEntry>,
    /// Omitted when no timestamped error was found
    #[serde(rename = "Timestamp Insights", skip_serializing_if = "Option::is_none")]
    pub timestamp_insights: Option<TimestampInsights>,
}

impl From<&ErrorAnalysis> for BasicAnalysisResponse {
    fn from(analysis: &ErrorAnalysis) -> Self {
        let error_summary = analysis
            .records
            .iter()
            .map(|record| ErrorSummaryEntry {
                type_and_description: record.key(),
                count: record.count,
            })
            .collect();

        let timestamp_insights = analysis.peak_bucket().map(|(peak_time, peak_errors)| TimestampInsights {
            total_errors: analysis.total_error_count,
            peak_time: peak_time.to_string(),
            peak_errors,
            time_concentration: analysis.histogram.clone(),
        });

        Self {
            error_summary,
            timestamp_insights,
        }
    }
}

/// Plain informational response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn no_errors() -> Self {
        Self {
            message: "No errors found in the log file.".to_string(),
        }
    }
}

/// How much of the document a summary covers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coverage {
    pub chunks_summarized: usize,
    pub chunks_total: usize,
    /// True when trailing chunks were not summarized
    pub truncated: bool,
}

/// Summary endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
}

/// Which context a query is answered against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryScope {
    /// Every chunk of the raw document
    #[default]
    Chunks,
    /// The compact error digest only
    Digest,
}

/// Query string of the query endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub scope: QueryScope,
}

/// Query endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::log::ErrorRecord;

    #[test]
    fn test_insights_omitted_without_timestamps() {
        let analysis = ErrorAnalysis {
            records: vec![ErrorRecord {
                code: "500".into(),
                description: "Internal server error".into(),
                count: 1,
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(BasicAnalysisResponse::from(&analysis)).unwrap();
        assert_eq!(json["Error Summary"][0]["Type & Description"], "Error 500: Internal server error");
        assert_eq!(json["Error Summary"][0]["Count"], 1);
        assert!(json.get("Timestamp Insights").is_none());
    }
}
