//! Log file upload validation
//!
//! Turns a multipart upload into a validated, trimmed log document before
//! any analysis runs

use crate::config::Settings;
use crate::utils::error::{helpers::invalid_input, AppError, AppResult, ErrorContext};
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::{info, warn};

/// Multipart field carrying the log file
pub const FILE_FIELD: &str = "file";

pub const EMPTY_FILE_MESSAGE: &str = "File is empty or contains no valid content.";
pub const MISSING_FILE_MESSAGE: &str = "No file uploaded.";

/// A validated upload
#[derive(Debug, Clone)]
pub struct LogUpload {
    pub filename: String,
    /// Decoded content with surrounding whitespace trimmed, never empty
    pub content: String,
}

/// Read the `file` field of a multipart upload and validate it
pub async fn read_log_upload(settings: &Settings, mut multipart: Multipart) -> AppResult<LogUpload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        info!("Validating file: {}", filename);

        if !settings.is_allowed_extension(&filename) {
            warn!("Rejected file with unsupported extension: {}", filename);
            return Err(invalid_input(invalid_type_message(settings)));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        let content = decode_log_content(&bytes)?;

        info!("Accepted {} ({} bytes)", filename, content.len());
        return Ok(LogUpload { filename, content });
    }

    Err(invalid_input(MISSING_FILE_MESSAGE))
}

/// Decode uploaded bytes as UTF-8 and reject blank content
pub fn decode_log_content(bytes: &[u8]) -> AppResult<String> {
    let text = std::str::from_utf8(bytes).invalid_input_context("Error reading file")?;
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(invalid_input(EMPTY_FILE_MESSAGE));
    }

    Ok(trimmed.to_string())
}

/// e.g. `Invalid file type. Please upload a .txt or .log file.`
pub fn invalid_type_message(settings: &Settings) -> String {
    let extensions: Vec<String> = settings
        .request
        .allowed_extensions
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect();

    format!("Invalid file type. Please upload a {} file.", extensions.join(" or "))
}

fn multipart_error(error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        invalid_input(format!("Error reading file: {}", error.body_text()))
    }
}
