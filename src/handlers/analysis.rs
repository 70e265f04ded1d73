//! Basic analysis handlers
//!
//! Regex-only endpoints: error frequency JSON and CSV download

use crate::handlers::upload::read_log_upload;
use crate::handlers::AppState;
use crate::models::api::{BasicAnalysisResponse, MessageResponse};
use crate::services::{exporter, extractor};
use crate::utils::error::AppResult;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::info;

/// Error frequency table and timestamp insights
///
/// POST /basic-analysis/
pub async fn basic_analysis(State(state): State<Arc<AppState>>, multipart: Multipart) -> AppResult<Response> {
    let upload = read_log_upload(&state.settings, multipart).await?;
    info!("Analyzing log file: {}", upload.filename);

    let analysis = extractor::extract(&upload.content);

    if analysis.records.is_empty() {
        return Ok(Json(MessageResponse::no_errors()).into_response());
    }

    Ok(Json(BasicAnalysisResponse::from(&analysis)).into_response())
}

/// Error frequency table as a CSV attachment
///
/// POST /download-error-summary/
pub async fn download_error_summary(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Response> {
    let upload = read_log_upload(&state.settings, multipart).await?;
    let analysis = extractor::extract(&upload.content);
    let csv = exporter::to_csv(&analysis.records)?;

    info!(
        "Exporting {} error rows for {}",
        analysis.records.len(),
        upload.filename
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=error_summary.csv"),
        ],
        csv,
    )
        .into_response())
}
