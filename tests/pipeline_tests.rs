//! Summary and query pipeline tests
//!
//! Drive the pipelines with scripted in-process generators

use async_trait::async_trait;
use logsift::models::log::Chunk;
use logsift::providers::{BackendError, BackendResult, Generator, PromptSet};
use logsift::services::{chunker, PipelineError, QueryPipeline, Stage, SummaryPipeline};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Echoes a tag for each prompt and records every prompt it sees
#[derive(Default)]
struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
    /// Prompts containing this text fail
    fail_on: Option<String>,
}

impl ScriptedGenerator {
    fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Default::default()
        }
    }

    fn recorded(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> BackendResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(marker) = &self.fail_on {
            if prompt.contains(marker.as_str()) {
                return Err(BackendError::Api("quota exceeded".to_string()));
            }
        }

        // Later chunks answer first to exercise ordering
        let delay = if prompt.contains("chunk-0") { 30 } else { 1 };
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if prompt.starts_with("The following are summaries") {
            return Ok("FINAL".to_string());
        }

        let tag = prompt
            .split_whitespace()
            .find(|word| word.starts_with("chunk-"))
            .unwrap_or("digest");
        Ok(format!("partial {}", tag))
    }
}

/// Never answers until cancelled
struct HangingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl Generator for HangingGenerator {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate(&self, _prompt: &str) -> BackendResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

fn chunks(count: usize) -> Vec<Chunk> {
    (0..count)
        .map(|id| Chunk::new(id, format!("chunk-{} ERROR 500 failure\n", id)))
        .collect()
}

fn summary_pipeline(generator: Arc<dyn Generator>) -> SummaryPipeline {
    SummaryPipeline::new(generator, Arc::new(PromptSet::default()), 4)
}

fn query_pipeline(generator: Arc<dyn Generator>) -> QueryPipeline {
    QueryPipeline::new(generator, Arc::new(PromptSet::default()), 4)
}

#[tokio::test]
async fn test_summary_reduces_partials_in_chunk_order() {
    let generator = Arc::new(ScriptedGenerator::default());
    let pipeline = summary_pipeline(generator.clone());

    let summary = pipeline
        .summarize(&chunks(3), 10, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.text, "FINAL");
    assert_eq!(summary.chunks_summarized, 3);
    assert_eq!(summary.chunks_total, 3);
    assert!(!summary.is_truncated());

    let prompts = generator.recorded();
    assert_eq!(prompts.len(), 4);

    let final_prompt = prompts.last().unwrap();
    assert!(final_prompt.contains("partial chunk-0\npartial chunk-1\npartial chunk-2"));
}

#[tokio::test]
async fn test_summary_truncates_to_leading_chunks() {
    let generator = Arc::new(ScriptedGenerator::default());
    let pipeline = summary_pipeline(generator.clone());

    let summary = pipeline
        .summarize(&chunks(5), 2, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.chunks_summarized, 2);
    assert_eq!(summary.chunks_total, 5);
    assert!(summary.is_truncated());

    let prompts = generator.recorded();
    // Two partial calls plus the reduce call
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().all(|p| !p.contains("chunk-2") && !p.contains("chunk-4")));
}

#[tokio::test]
async fn test_summary_of_no_chunks_skips_backend() {
    let generator = Arc::new(ScriptedGenerator::default());
    let pipeline = summary_pipeline(generator.clone());

    let summary = pipeline.summarize(&[], 10, &CancellationToken::new()).await.unwrap();

    assert_eq!(summary.text, "");
    assert_eq!(summary.chunks_total, 0);
    assert!(generator.recorded().is_empty());
}

#[tokio::test]
async fn test_partial_failure_reports_chunk_and_skips_reduce() {
    let generator = Arc::new(ScriptedGenerator::failing_on("chunk-1"));
    let pipeline = summary_pipeline(generator.clone());

    let error = pipeline
        .summarize(&chunks(3), 10, &CancellationToken::new())
        .await
        .unwrap_err();

    match error {
        PipelineError::Generation { stage, chunk_id, cause } => {
            assert_eq!(stage, Stage::Partial);
            assert_eq!(chunk_id, Some(1));
            assert_eq!(cause, BackendError::Api("quota exceeded".to_string()));
        }
        other => panic!("Expected generation error, got {:?}", other),
    }

    assert!(generator
        .recorded()
        .iter()
        .all(|p| !p.starts_with("The following are summaries")));
}

#[tokio::test]
async fn test_final_failure_is_attributed_to_final_stage() {
    let generator = Arc::new(ScriptedGenerator::failing_on("The following are summaries"));
    let pipeline = summary_pipeline(generator);

    let error = pipeline
        .summarize(&chunks(2), 10, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PipelineError::Generation {
            stage: Stage::Final,
            chunk_id: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_summarize_digest_is_single_call() {
    let generator = Arc::new(ScriptedGenerator::default());
    let pipeline = summary_pipeline(generator.clone());

    let text = pipeline
        .summarize_digest("{\"Error Summary\": []}", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(text, "FINAL");
    let prompts = generator.recorded();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("{\"Error Summary\": []}"));
}

#[tokio::test]
async fn test_query_covers_every_chunk_without_reduce() {
    let generator = Arc::new(ScriptedGenerator::default());
    let pipeline = query_pipeline(generator.clone());

    let answer = pipeline
        .answer(&chunks(12), "What failed?", &CancellationToken::new())
        .await
        .unwrap();

    let lines: Vec<&str> = answer.lines().collect();
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[0], "partial chunk-0");
    assert_eq!(lines[11], "partial chunk-11");

    let prompts = generator.recorded();
    assert_eq!(prompts.len(), 12);
    assert!(prompts.iter().all(|p| p.contains("Respond to the user's query: What failed?")));
}

#[tokio::test]
async fn test_query_failure_reports_chunk() {
    let generator = Arc::new(ScriptedGenerator::failing_on("chunk-2"));
    let pipeline = query_pipeline(generator);

    let error = pipeline
        .answer(&chunks(4), "Why?", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PipelineError::Generation {
            stage: Stage::Partial,
            chunk_id: Some(2),
            ..
        }
    ));
}

#[tokio::test]
async fn test_query_digest_is_single_call() {
    let generator = Arc::new(ScriptedGenerator::default());
    let pipeline = query_pipeline(generator.clone());

    let answer = pipeline
        .answer_digest("Error 500: boom - Count: 2", "How often?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer, "partial digest");
    assert_eq!(generator.recorded().len(), 1);
}

#[tokio::test]
async fn test_cancellation_abandons_outstanding_calls() {
    let generator = Arc::new(HangingGenerator {
        calls: AtomicUsize::new(0),
    });
    let pipeline = summary_pipeline(generator.clone());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), pipeline.summarize(&chunks(3), 10, &cancel))
        .await
        .expect("pipeline should stop once cancelled");

    assert_eq!(result.unwrap_err(), PipelineError::Cancelled);
    assert!(generator.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_pipeline_over_chunked_document() {
    let document: String = (0..40)
        .map(|i| format!("[2025-01-19 10:{:02}:00] ERROR 500: failure {}\n", i, i))
        .collect();
    let chunks = chunker::split(&document, 200);
    assert!(chunks.len() > 1);

    let generator = Arc::new(ScriptedGenerator::default());
    let pipeline = query_pipeline(generator.clone());

    pipeline
        .answer(&chunks, "Anything odd?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(generator.recorded().len(), chunks.len());
}

#[tokio::test]
async fn test_pipelines_run_on_spawned_tasks() {
    let generator = Arc::new(ScriptedGenerator::default());
    let summary = summary_pipeline(generator.clone());
    let query = query_pipeline(generator.clone());
    let chunks = chunks(3);

    let summary_task = {
        let chunks = chunks.clone();
        tokio::spawn(async move { summary.summarize(&chunks, 10, &CancellationToken::new()).await })
    };
    let query_task =
        tokio::spawn(async move { query.answer(&chunks, "What failed?", &CancellationToken::new()).await });

    assert_eq!(summary_task.await.unwrap().unwrap().text, "FINAL");
    assert_eq!(query_task.await.unwrap().unwrap().lines().count(), 3);
}

/// Tracks the highest number of calls in flight at once
#[derive(Default)]
struct GaugedGenerator {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Generator for GaugedGenerator {
    fn name(&self) -> &str {
        "gauged"
    }

    async fn generate(&self, _prompt: &str) -> BackendResult<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("ok".to_string())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_is_bounded() {
    let generator = Arc::new(GaugedGenerator::default());
    let pipeline = QueryPipeline::new(generator.clone(), Arc::new(PromptSet::default()), 2);

    let answer = pipeline
        .answer(&chunks(8), "Why?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.lines().count(), 8);
    assert!(generator.peak.load(Ordering::SeqCst) <= 2);
    assert!(generator.peak.load(Ordering::SeqCst) >= 1);
}
