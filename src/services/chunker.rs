//! Line-aligned chunking
//!
//! Splits a document into bounded chunks for submission to the generation
//! backend. Lines are never split: a line longer than the limit becomes a
//! chunk of its own.

use crate::models::log::Chunk;
use tracing::debug;

/// Split `document` into chunks of at most `max_chunk_chars` characters, with no overlap.
pub fn split(document: &str, max_chunk_chars: usize) -> Vec<Chunk> {
    split_with_overlap(document, max_chunk_chars, 0)
}

/// Split `document`, seeding each new chunk with trailing whole lines of the
/// previous one totalling at most `overlap_chars` characters.
///
/// With `overlap_chars == 0` the chunk texts concatenate back to `document`.
pub fn split_with_overlap(document: &str, max_chunk_chars: usize, overlap_chars: usize) -> Vec<Chunk> {
    let max_chunk_chars = max_chunk_chars.max(1);
    let mut chunks = Vec::new();
    // (line, char length) pairs of the open chunk
    let mut current: Vec<(&str, usize)> = Vec::new();
    let mut current_len = 0usize;

    for line in document.split_inclusive('\n') {
        let line_len = line.chars().count();

        if !current.is_empty() && current_len + line_len > max_chunk_chars {
            let seed = overlap_tail(&current, overlap_chars);
            chunks.push(close_chunk(chunks.len(), &current));

            current.clear();
            current_len = 0;

            let seed_len: usize = seed.iter().map(|(_, len)| len).sum();
            if seed_len + line_len <= max_chunk_chars {
                current.extend(seed);
                current_len = seed_len;
            }
        }

        current.push((line, line_len));
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(close_chunk(chunks.len(), &current));
    }

    debug!(
        "Split {} chars into {} chunks (max {} chars, overlap {})",
        document.chars().count(),
        chunks.len(),
        max_chunk_chars,
        overlap_chars
    );

    chunks
}

fn close_chunk(id: usize, lines: &[(&str, usize)]) -> Chunk {
    let text: String = lines.iter().map(|(line, _)| *line).collect();
    Chunk::new(id, text)
}

/// Longest run of trailing lines fitting in `budget` characters
fn overlap_tail<'a>(lines: &[(&'a str, usize)], budget: usize) -> Vec<(&'a str, usize)> {
    let mut used = 0;
    let mut start = lines.len();

    for (idx, (_, len)) in lines.iter().enumerate().rev() {
        if used + len > budget {
            break;
        }
        used += len;
        start = idx;
    }

    // Never carry the whole previous chunk forward
    if start == 0 {
        start = 1.min(lines.len());
    }

    lines[start..].to_vec()
}
