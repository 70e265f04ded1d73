//! AI-assisted handlers
//!
//! Summary and query endpoints backed by the generation pipelines. Every
//! run is bounded by the pipeline timeout and cancelled with its request.

use crate::handlers::upload::read_log_upload;
use crate::handlers::AppState;
use crate::models::api::{
    BasicAnalysisResponse, Coverage, MessageResponse, QueryParams, QueryResponse, QueryScope, SummaryResponse,
};
use crate::services::{chunker, extractor, PipelineError};
use crate::utils::error::{helpers::invalid_input, AppError, AppResult};
use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Map-reduce summary over the raw log chunks
///
/// POST /summary-raw-log/
pub async fn summary_raw_log(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<SummaryResponse>> {
    let upload = read_log_upload(&state.settings, multipart).await?;
    let analysis = &state.settings.analysis;
    let chunks = chunker::split_with_overlap(&upload.content, analysis.max_chunk_chars, analysis.chunk_overlap_chars);

    info!("Summarizing {} in {} chunks", upload.filename, chunks.len());

    let cancel = request_token(&state);
    let _guard = cancel.clone().drop_guard();
    let summary = run_guarded(
        &state,
        "summary",
        state.summary.summarize(&chunks, analysis.max_summary_chunks, &cancel),
    )
    .await?;

    let coverage = Coverage {
        chunks_summarized: summary.chunks_summarized,
        chunks_total: summary.chunks_total,
        truncated: summary.is_truncated(),
    };

    Ok(Json(SummaryResponse {
        summary: summary.text,
        coverage: Some(coverage),
    }))
}

/// Summary of the extracted error report
///
/// POST /summary-log/
pub async fn summary_log(State(state): State<Arc<AppState>>, multipart: Multipart) -> AppResult<Response> {
    let upload = read_log_upload(&state.settings, multipart).await?;
    let analysis = extractor::extract(&upload.content);

    if analysis.records.is_empty() {
        return Ok(Json(MessageResponse::no_errors()).into_response());
    }

    let report = serde_json::to_string_pretty(&BasicAnalysisResponse::from(&analysis))?;
    info!("Summarizing error report of {}", upload.filename);

    let cancel = request_token(&state);
    let _guard = cancel.clone().drop_guard();
    let summary = run_guarded(&state, "summary", state.summary.summarize_digest(&report, &cancel)).await?;

    Ok(Json(SummaryResponse {
        summary,
        coverage: None,
    })
    .into_response())
}

/// Free-text question about the log
///
/// POST /query-log/?query=...&scope=chunks|digest
pub async fn query_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
    multipart: Multipart,
) -> AppResult<Json<QueryResponse>> {
    let question = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| invalid_input("Query cannot be empty."))?
        .to_string();

    let upload = read_log_upload(&state.settings, multipart).await?;

    let cancel = request_token(&state);
    let _guard = cancel.clone().drop_guard();

    let response = match params.scope {
        QueryScope::Chunks => {
            let analysis = &state.settings.analysis;
            let chunks =
                chunker::split_with_overlap(&upload.content, analysis.max_chunk_chars, analysis.chunk_overlap_chars);
            info!("Answering query over {} chunks of {}", chunks.len(), upload.filename);

            run_guarded(&state, "response", state.query.answer(&chunks, &question, &cancel)).await?
        }
        QueryScope::Digest => {
            let digest = extractor::extract(&upload.content).digest();
            info!("Answering query over error digest of {}", upload.filename);

            run_guarded(&state, "response", state.query.answer_digest(&digest, &question, &cancel)).await?
        }
    };

    Ok(Json(QueryResponse {
        query: question,
        response,
    }))
}

/// Child of the shutdown token scoped to one request.
///
/// Callers hold a drop guard so outstanding calls stop when the handler
/// finishes or is dropped.
fn request_token(state: &AppState) -> CancellationToken {
    state.shutdown.child_token()
}

/// Bound a pipeline run by the configured time budget
async fn run_guarded<T, Fut>(state: &AppState, context: &'static str, run: Fut) -> AppResult<T>
where
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let budget = Duration::from_secs(state.settings.request.pipeline_timeout);

    match tokio::time::timeout(budget, run).await {
        Ok(result) => result.map_err(|e| AppError::generation(context, e)),
        Err(_) => {
            warn!("Pipeline exceeded {}s budget, cancelling outstanding calls", budget.as_secs());
            Err(AppError::Timeout)
        }
    }
}
