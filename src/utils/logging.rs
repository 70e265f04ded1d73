//! Logging utilities
//!
//! Helpers for keeping prompt and response text in logs short

/// Truncate a string to `max_chars` characters with a note about original length
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let total = s.chars().count();
            format!("{}... ({} chars truncated)", &s[..cut], total - max_chars)
        }
        None => s.to_string(),
    }
}
