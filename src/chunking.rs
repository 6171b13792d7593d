//! # Fallback Chunking Module
//!
//! ## Purpose
//! Deterministic sliding-window chunker used when no externally parsed
//! chunking is available. Produces overlapping text chunks with explicit
//! safety bounds.
//!
//! ## Input/Output Specification
//! - **Input**: Extracted document text, window size, overlap
//! - **Output**: Ordered list of trimmed, non-empty chunk strings
//! - **Guarantee**: Always terminates; the window advance is clamped to at
//!   least one character and total iterations are capped regardless of input
//!   length or pathological size/overlap values
//!
//! ## Key Features
//! - Fixed-size window with fixed overlap, character-based (UTF-8 safe)
//! - Trailing remainder emitted as a final chunk unless it duplicates the
//!   previous one
//! - Hard iteration cap as a backstop against configuration mistakes

/// Hard cap on chunker iterations
pub const MAX_CHUNKS: usize = 1000;

/// Sliding-window text chunker with bounded output
#[derive(Debug, Clone, Copy)]
pub struct FallbackChunker {
    size: usize,
    overlap: usize,
}

impl Default for FallbackChunker {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

impl FallbackChunker {
    /// Create a chunker with the given window size and overlap.
    ///
    /// An overlap greater than or equal to the size is tolerated: the window
    /// advance is clamped so the chunker still terminates.
    pub fn new(size: usize, overlap: usize) -> Self {
        Self {
            size: size.max(1),
            overlap,
        }
    }

    /// Split text into overlapping chunks.
    ///
    /// Empty input produces an empty list. Windows are measured in characters
    /// so multi-byte input never splits inside a code point.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let step = self.size.saturating_sub(self.overlap).max(1);

        let mut chunks = Vec::new();
        let mut position = 0usize;
        let mut iterations = 0usize;

        while position < total && iterations < MAX_CHUNKS {
            iterations += 1;

            let end = (position + self.size).min(total);
            let window: String = chars[position..end].iter().collect();
            let window = window.trim();
            if !window.is_empty() {
                chunks.push(window.to_string());
            }

            position += step;

            // Within one window of the end: take the rest as a final chunk
            // unless it repeats the chunk just emitted, then stop.
            if total - position.min(total) < self.size {
                if position < total {
                    let tail: String = chars[position..].iter().collect();
                    let tail = tail.trim();
                    if !tail.is_empty() && chunks.last().map(String::as_str) != Some(tail) {
                        chunks.push(tail.to_string());
                    }
                }
                break;
            }
        }

        tracing::debug!(
            "Chunked {} chars into {} chunks (size={}, overlap={})",
            total,
            chunks.len(),
            self.size,
            self.overlap
        );

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_list() {
        let chunker = FallbackChunker::default();
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn short_input_yields_single_chunk() {
        let chunker = FallbackChunker::default();
        let chunks = chunker.chunk("a short judgment body");
        assert_eq!(chunks, vec!["a short judgment body"]);
    }

    #[test]
    fn windows_overlap_by_configured_amount() {
        let chunker = FallbackChunker::new(10, 4);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.chunk(text);

        assert_eq!(chunks[0], "abcdefghij");
        // The next window starts size - overlap = 6 characters later
        assert_eq!(chunks[1], "ghijklmnop");
        // No content is dropped: every character appears in some chunk
        for c in text.chars() {
            assert!(chunks.iter().any(|chunk| chunk.contains(c)));
        }
    }

    #[test]
    fn trailing_remainder_is_emitted_once() {
        let chunker = FallbackChunker::new(10, 0);
        let chunks = chunker.chunk("abcdefghijklm");
        assert_eq!(chunks, vec!["abcdefghij", "klm"]);
    }

    #[test]
    fn duplicate_tail_is_suppressed() {
        // The last full window trims to "ab"; the remaining tail also trims
        // to "ab" and must not be emitted twice.
        let chunker = FallbackChunker::new(5, 3);
        let chunks = chunker.chunk("xx   ab");
        assert_eq!(chunks, vec!["xx", "ab"]);
    }

    #[test]
    fn pathological_overlap_still_terminates() {
        let chunker = FallbackChunker::new(5, 5);
        let text = "x".repeat(50);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() <= MAX_CHUNKS + 1);

        let chunker = FallbackChunker::new(5, 9);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() <= MAX_CHUNKS + 1);
    }

    #[test]
    fn iteration_cap_bounds_output_for_huge_input() {
        let chunker = FallbackChunker::new(1, 0);
        let text = "y".repeat(5000);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), MAX_CHUNKS);
    }

    #[test]
    fn multibyte_input_never_splits_code_points() {
        let chunker = FallbackChunker::new(3, 1);
        let text = "न्यायालय ने कहा कि अपील स्वीकार की जाती है";
        // Must not panic and must preserve every non-space character
        let chunks = chunker.chunk(text);
        assert!(!chunks.is_empty());
        let joined: String = chunks.concat();
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            assert!(joined.contains(c));
        }
    }

    #[test]
    fn whitespace_only_window_is_skipped() {
        let chunker = FallbackChunker::new(5, 0);
        let text = "abcde     fghij";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks, vec!["abcde", "fghij"]);
    }
}
