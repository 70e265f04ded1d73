//! Query pipeline
//!
//! Answers a question against every chunk concurrently and joins the
//! per-chunk answers in chunk order. There is no reduce pass.

use super::{fan_out, generate_final, PipelineError};
use crate::models::log::Chunk;
use crate::providers::{Generator, Instruction, PromptSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct QueryPipeline {
    generator: Arc<dyn Generator>,
    prompts: Arc<PromptSet>,
    max_concurrency: usize,
}

impl QueryPipeline {
    pub fn new(generator: Arc<dyn Generator>, prompts: Arc<PromptSet>, max_concurrency: usize) -> Self {
        Self {
            generator,
            prompts,
            max_concurrency,
        }
    }

    /// Answer `question` against all chunks, newline-joined in id order
    pub async fn answer(
        &self,
        chunks: &[Chunk],
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let answers = fan_out(
            &self.generator,
            &self.prompts,
            chunks,
            Instruction::AnswerQuery { question },
            self.max_concurrency,
            cancel,
        )
        .await?;

        Ok(answers.join("\n"))
    }

    /// Answer `question` against the compact error digest in one call
    pub async fn answer_digest(
        &self,
        digest: &str,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        generate_final(
            self.generator.as_ref(),
            &self.prompts,
            Instruction::AnswerQuery { question },
            digest,
            cancel,
        )
        .await
    }
}
