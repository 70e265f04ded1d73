//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Generation backend configuration
    pub openai: OpenAIConfig,
    /// Chunking and fan-out configuration
    pub analysis: AnalysisConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// OpenAI-compatible backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Model used for every generation call
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap (optional)
    pub max_tokens: Option<u32>,
    /// Per-call timeout in seconds
    pub timeout: u64,
}

/// Chunking and generation fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum characters per chunk
    pub max_chunk_chars: usize,
    /// Trailing characters carried into the next chunk
    pub chunk_overlap_chars: usize,
    /// Number of leading chunks summarized individually
    pub max_summary_chunks: usize,
    /// Generation calls allowed in flight per request
    pub max_concurrent_generations: usize,
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
    /// Overall timeout for one AI pipeline run, in seconds
    pub pipeline_timeout: u64,
    /// Accepted file extensions, lowercase, without the dot
    pub allowed_extensions: Vec<String>,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allowed origins for CORS
    pub allowed_origins: Vec<String>,
    /// Whether CORS is enabled
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Settings {
    /// Create a new configuration instance from the process environment
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let settings = Self {
            server: ServerConfig {
                host: get("SERVER_HOST", "0.0.0.0"),
                port: get("SERVER_PORT", "8000")
                    .parse()
                    .context("Invalid port number")?,
            },
            openai: OpenAIConfig {
                api_key: lookup("OPENAI_API_KEY")
                    .context("OPENAI_API_KEY environment variable not set")?,
                base_url: get("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: get("OPENAI_MODEL", "gpt-4o-mini"),
                temperature: get("OPENAI_TEMPERATURE", "0.7")
                    .parse()
                    .context("Invalid temperature value")?,
                max_tokens: lookup("OPENAI_MAX_TOKENS")
                    .map(|v| v.parse())
                    .transpose()
                    .context("Invalid max tokens value")?,
                timeout: get("OPENAI_TIMEOUT", "60")
                    .parse()
                    .context("Invalid timeout value")?,
            },
            analysis: AnalysisConfig {
                max_chunk_chars: get("MAX_CHUNK_CHARS", "14000")
                    .parse()
                    .context("Invalid maximum chunk size")?,
                chunk_overlap_chars: get("CHUNK_OVERLAP_CHARS", "0")
                    .parse()
                    .context("Invalid chunk overlap")?,
                max_summary_chunks: get("MAX_SUMMARY_CHUNKS", "10")
                    .parse()
                    .context("Invalid maximum summary chunks")?,
                max_concurrent_generations: get("MAX_CONCURRENT_GENERATIONS", "8")
                    .parse()
                    .context("Invalid maximum concurrent generations")?,
            },
            request: RequestConfig {
                max_upload_size: get("MAX_UPLOAD_SIZE", "10485760")
                    .parse()
                    .context("Invalid maximum upload size")?,
                pipeline_timeout: get("PIPELINE_TIMEOUT", "300")
                    .parse()
                    .context("Invalid pipeline timeout")?,
                allowed_extensions: split_list(&get("ALLOWED_EXTENSIONS", "txt,log"))
                    .into_iter()
                    .map(|ext| ext.trim_start_matches('.').to_lowercase())
                    .collect(),
            },
            security: SecurityConfig {
                allowed_origins: split_list(&get("ALLOWED_ORIGINS", "*")),
                cors_enabled: get("CORS_ENABLED", "true")
                    .parse()
                    .context("Invalid CORS enabled flag")?,
            },
            logging: LoggingConfig {
                level: get("RUST_LOG", "info"),
                format: get("LOG_FORMAT", "text"),
            },
        };

        // Validate configuration
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        if self.openai.api_key.is_empty() {
            anyhow::bail!("OpenAI API key cannot be empty");
        }

        if self.openai.api_key.contains(char::is_whitespace) {
            anyhow::bail!("OpenAI API key cannot contain whitespace characters");
        }

        if !self.openai.base_url.starts_with("http") {
            anyhow::bail!("Invalid OpenAI base URL format, should start with 'http'");
        }

        if self.openai.model.trim().is_empty() {
            anyhow::bail!("Model name cannot be empty");
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            anyhow::bail!("Temperature must be between 0 and 2, got {}", self.openai.temperature);
        }

        if self.openai.timeout == 0 || self.request.pipeline_timeout == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        if self.analysis.max_chunk_chars == 0 {
            anyhow::bail!("Maximum chunk size cannot be 0");
        }

        if self.analysis.chunk_overlap_chars >= self.analysis.max_chunk_chars {
            anyhow::bail!(
                "Chunk overlap ({}) must be smaller than the maximum chunk size ({})",
                self.analysis.chunk_overlap_chars,
                self.analysis.max_chunk_chars
            );
        }

        if self.analysis.max_summary_chunks == 0 {
            anyhow::bail!("Maximum summary chunks cannot be 0");
        }

        if self.analysis.max_concurrent_generations == 0 {
            anyhow::bail!("Maximum concurrent generations cannot be 0");
        }

        if self.request.max_upload_size == 0 {
            anyhow::bail!("Maximum upload size cannot be 0");
        }

        if self.request.allowed_extensions.is_empty() {
            anyhow::bail!("At least one allowed file extension is required");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Check whether a file name carries an accepted extension
    pub fn is_allowed_extension(&self, filename: &str) -> bool {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.request.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }
}

/// Split a comma separated list, dropping empty entries
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
