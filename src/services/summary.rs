//! Summary pipeline
//!
//! Map: summarize the leading chunks concurrently. Reduce: one final call
//! over the partial summaries joined in chunk order.

use super::{fan_out, generate_final, PipelineError};
use crate::models::log::Chunk;
use crate::providers::{Generator, Instruction, PromptSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Final summary with its document coverage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub chunks_summarized: usize,
    pub chunks_total: usize,
}

impl Summary {
    /// True when trailing chunks were left out of the summary
    pub fn is_truncated(&self) -> bool {
        self.chunks_summarized < self.chunks_total
    }
}

#[derive(Clone)]
pub struct SummaryPipeline {
    generator: Arc<dyn Generator>,
    prompts: Arc<PromptSet>,
    max_concurrency: usize,
}

impl SummaryPipeline {
    pub fn new(generator: Arc<dyn Generator>, prompts: Arc<PromptSet>, max_concurrency: usize) -> Self {
        Self {
            generator,
            prompts,
            max_concurrency,
        }
    }

    /// Summarize the first `max_chunks` chunks, then reduce them into one overview.
    ///
    /// Any partial failure aborts the run before the reduce call is issued.
    pub async fn summarize(
        &self,
        chunks: &[Chunk],
        max_chunks: usize,
        cancel: &CancellationToken,
    ) -> Result<Summary, PipelineError> {
        let selected = &chunks[..chunks.len().min(max_chunks)];

        if selected.len() < chunks.len() {
            info!(
                "Summarizing first {} of {} chunks, {} trailing chunks not covered",
                selected.len(),
                chunks.len(),
                chunks.len() - selected.len()
            );
        }

        if selected.is_empty() {
            return Ok(Summary {
                text: String::new(),
                chunks_summarized: 0,
                chunks_total: chunks.len(),
            });
        }

        let partials = fan_out(
            &self.generator,
            &self.prompts,
            selected,
            Instruction::SummarizeFragment,
            self.max_concurrency,
            cancel,
        )
        .await?;

        debug!("Reducing {} partial summaries", partials.len());

        let text = generate_final(
            self.generator.as_ref(),
            &self.prompts,
            Instruction::SummarizeFinal,
            &partials.join("\n"),
            cancel,
        )
        .await?;

        Ok(Summary {
            text,
            chunks_summarized: selected.len(),
            chunks_total: chunks.len(),
        })
    }

    /// Single final-prompt call over a pre-aggregated error report
    pub async fn summarize_digest(&self, report: &str, cancel: &CancellationToken) -> Result<String, PipelineError> {
        generate_final(
            self.generator.as_ref(),
            &self.prompts,
            Instruction::SummarizeFinal,
            report,
            cancel,
        )
        .await
    }
}
