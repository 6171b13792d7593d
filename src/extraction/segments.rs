//! Positional segmentation of judgments into logical sections.
//!
//! Section-heading keywords (facts, issues, arguments, held) are located
//! across the whole text; match offsets are sorted ascending and each segment
//! runs from its own match to the next match of any kind, the last one to the
//! end of the text. Only the first occurrence of a given kind is retained.
//! Text with no keyword match at all becomes a single `full_text` segment.

use crate::errors::{RagError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical section of a judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Facts,
    Issues,
    Arguments,
    Held,
    /// Fallback when no section keyword matched anywhere
    FullText,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SegmentKind::Facts => "facts",
            SegmentKind::Issues => "issues",
            SegmentKind::Arguments => "arguments",
            SegmentKind::Held => "held",
            SegmentKind::FullText => "full_text",
        };
        f.write_str(s)
    }
}

/// Mapping from section kind to the contiguous substring ascribed to it
pub type Segments = BTreeMap<SegmentKind, String>;

/// Keyword-based judgment segmenter
pub struct JudgmentSegmenter {
    patterns: Vec<(SegmentKind, Regex)>,
}

impl JudgmentSegmenter {
    /// Create a segmenter with the section-heading keyword patterns compiled
    pub fn new() -> Result<Self> {
        let table: [(SegmentKind, &str); 4] = [
            (SegmentKind::Facts, r"(?i)(FACTS?|BACKGROUND|BRIEF FACTS)"),
            (
                SegmentKind::Issues,
                r"(?i)(ISSUES?|POINTS? FOR CONSIDERATION|QUESTIONS?)",
            ),
            (
                SegmentKind::Arguments,
                r"(?i)(ARGUMENTS?|SUBMISSIONS?|CONTENTIONS?)",
            ),
            (SegmentKind::Held, r"(?i)(HELD|JUDGMENT|DECISION|ORDER)"),
        ];

        let patterns = table
            .into_iter()
            .map(|(kind, pattern)| {
                Regex::new(pattern)
                    .map(|re| (kind, re))
                    .map_err(|e| RagError::Internal {
                        message: format!("Invalid segment regex '{}': {}", pattern, e),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Split the text into logical sections
    pub fn segment(&self, text: &str) -> Segments {
        let mut positions: Vec<(usize, SegmentKind)> = Vec::new();
        for (kind, re) in &self.patterns {
            for m in re.find_iter(text) {
                positions.push((m.start(), *kind));
            }
        }
        positions.sort_by_key(|(start, _)| *start);

        let mut segments = Segments::new();
        for (i, (start, kind)) in positions.iter().enumerate() {
            let end = positions
                .get(i + 1)
                .map(|(next_start, _)| *next_start)
                .unwrap_or(text.len());

            // First occurrence of a kind wins even when its keyword recurs
            segments
                .entry(*kind)
                .or_insert_with(|| text[*start..end].trim().to_string());
        }

        if segments.is_empty() {
            segments.insert(SegmentKind::FullText, text.to_string());
        }

        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> JudgmentSegmenter {
        JudgmentSegmenter::new().expect("patterns compile")
    }

    #[test]
    fn no_keywords_yields_single_full_text_segment() {
        let s = segmenter();
        let text = "an unremarkable letter with no section markers";
        let segments = s.segment(text);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments.get(&SegmentKind::FullText).map(String::as_str), Some(text));
    }

    #[test]
    fn segments_are_contiguous_in_offset_order() {
        let s = segmenter();
        let text = "FACTS: the appellant was convicted. ISSUES: whether bail applies. HELD: appeal allowed.";
        let segments = s.segment(text);

        assert_eq!(
            segments.get(&SegmentKind::Facts).map(String::as_str),
            Some("FACTS: the appellant was convicted.")
        );
        assert_eq!(
            segments.get(&SegmentKind::Issues).map(String::as_str),
            Some("ISSUES: whether bail applies.")
        );
        assert_eq!(
            segments.get(&SegmentKind::Held).map(String::as_str),
            Some("HELD: appeal allowed.")
        );

        // Concatenation in offset order reconstructs the text from the first
        // match onward (boundaries here carry a single separating space).
        let rebuilt = [SegmentKind::Facts, SegmentKind::Issues, SegmentKind::Held]
            .iter()
            .map(|k| segments[k].as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn first_occurrence_of_a_kind_is_retained() {
        let s = segmenter();
        let text = "FACTS: first statement of facts. HELD: interim order. FACTS: restated facts at the end.";
        let segments = s.segment(text);
        assert!(segments
            .get(&SegmentKind::Facts)
            .unwrap()
            .starts_with("FACTS: first statement"));
    }

    #[test]
    fn last_segment_runs_to_end_of_text() {
        let s = segmenter();
        let text = "BACKGROUND: how the dispute began and everything that followed after it";
        let segments = s.segment(text);
        assert_eq!(segments.get(&SegmentKind::Facts).map(String::as_str), Some(text));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let s = segmenter();
        let segments = s.segment("facts: lower-case heading. held: done.");
        assert!(segments.contains_key(&SegmentKind::Facts));
        assert!(segments.contains_key(&SegmentKind::Held));
    }
}
