//! Provider module
//!
//! Defines the text generation seam used by the AI pipelines, the fixed
//! prompt shapes, and the OpenAI-compatible implementation

pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAIGenerator;
pub use prompts::{Instruction, PromptSet};

/// Failure of a single generation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced an HTTP response
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success status without a structured error body
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Structured error reported by the backend
    #[error("backend error: {0}")]
    Api(String),

    /// Success status but no usable text
    #[error("backend returned an empty response")]
    EmptyResponse,

    /// Call abandoned because its request was cancelled
    #[error("generation cancelled")]
    Cancelled,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Text generation backend
///
/// Treated as an opaque fallible function from prompt to text. Implementations
/// must be safe to share across concurrent calls.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend name, for logs and health output
    fn name(&self) -> &str;

    /// Generate text for a fully rendered prompt
    async fn generate(&self, prompt: &str) -> BackendResult<String>;
}
