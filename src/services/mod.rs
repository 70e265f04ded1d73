//! Service layer module
//!
//! Contains the error extractor, the chunker, the AI summary and query
//! pipelines, and the CSV exporter

pub mod chunker;
pub mod exporter;
pub mod extractor;
pub mod query;
pub mod summary;

use crate::models::log::Chunk;
use crate::providers::{BackendError, BackendResult, Generator, Instruction, PromptSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

pub use query::QueryPipeline;
pub use summary::{Summary, SummaryPipeline};

/// Pipeline stage a generation failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Per-chunk calls
    Partial,
    /// Single reduce or digest call
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Partial => write!(f, "partial"),
            Stage::Final => write!(f, "final"),
        }
    }
}

/// Failure of a summary or query pipeline run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(
        "{stage} stage failed{}: {cause}",
        .chunk_id.map(|id| format!(" on chunk {}", id)).unwrap_or_default()
    )]
    Generation {
        stage: Stage,
        chunk_id: Option<usize>,
        #[source]
        cause: BackendError,
    },

    #[error("pipeline cancelled")]
    Cancelled,

    /// A spawned generation task panicked
    #[error("generation task failed: {0}")]
    Task(String),
}

impl PipelineError {
    fn from_backend(stage: Stage, chunk_id: Option<usize>, cause: BackendError) -> Self {
        match cause {
            BackendError::Cancelled => PipelineError::Cancelled,
            cause => PipelineError::Generation { stage, chunk_id, cause },
        }
    }
}

/// Run one generation call, abandoning it when `cancel` fires
async fn generate_cancellable(
    generator: &dyn Generator,
    prompt: &str,
    cancel: &CancellationToken,
) -> BackendResult<String> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BackendError::Cancelled),
        result = generator.generate(prompt) => result,
    }
}

/// Generate once per chunk with at most `concurrency` calls in flight.
///
/// Each call runs as its own task on owned inputs. Results come back in
/// chunk id order. The first failure aborts every outstanding call.
async fn fan_out(
    generator: &Arc<dyn Generator>,
    prompts: &PromptSet,
    chunks: &[Chunk],
    instruction: Instruction<'_>,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Result<Vec<String>, PipelineError> {
    debug!(
        "Dispatching {} {} calls (concurrency {})",
        chunks.len(),
        instruction.label(),
        concurrency
    );

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for chunk in chunks {
        let id = chunk.id;
        let prompt = prompts.render(instruction, &chunk.text);
        let generator = Arc::clone(generator);
        let permits = Arc::clone(&permits);
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return (id, Err(BackendError::Cancelled));
            };
            (id, generate_cancellable(generator.as_ref(), &prompt, &cancel).await)
        });
    }

    let mut results: Vec<(usize, String)> = Vec::with_capacity(chunks.len());

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(text))) => results.push((id, text)),
            Ok((id, Err(cause))) => {
                tasks.abort_all();
                return Err(PipelineError::from_backend(Stage::Partial, Some(id), cause));
            }
            Err(e) => {
                error!("Generation task failed: {}", e);
                tasks.abort_all();
                return Err(PipelineError::Task(e.to_string()));
            }
        }
    }

    results.sort_by_key(|(id, _)| *id);
    Ok(results.into_iter().map(|(_, text)| text).collect())
}

/// Single generation call attributed to the final stage
async fn generate_final(
    generator: &dyn Generator,
    prompts: &PromptSet,
    instruction: Instruction<'_>,
    context: &str,
    cancel: &CancellationToken,
) -> Result<String, PipelineError> {
    let prompt = prompts.render(instruction, context);
    generate_cancellable(generator, &prompt, cancel)
        .await
        .map_err(|cause| PipelineError::from_backend(Stage::Final, None, cause))
}
