//! # Utilities Module
//!
//! ## Purpose
//! Small helpers shared across the service: operation timing and text
//! previews for log output.

use std::time::Instant;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop timer and log duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

/// Extract preview text from longer content for log lines
pub fn preview(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().take(max_words).collect();
    let preview = words.join(" ");

    if words.len() >= max_words {
        format!("{}...", preview)
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("one two three four", 2), "one two...");
        assert_eq!(preview("one two", 5), "one two");
    }

    #[test]
    fn timer_reports_elapsed() {
        let timer = Timer::new("test");
        assert!(timer.elapsed_ms() < 1000);
    }
}
