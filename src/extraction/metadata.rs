//! Pattern-based extraction of Indian legal metadata.
//!
//! Generic document parsers do not understand Indian legal context; the rules
//! here capture reporter citations (AIR/SCC/SCR), court hierarchy, CORAM
//! panels, statutory references and cited precedents. Every extraction is a
//! pure function over the input text: patterns that find nothing produce
//! omitted fields, never errors.

use crate::errors::{RagError, Result};
use crate::extraction::segments::{JudgmentSegmenter, Segments};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum judges taken from a CORAM line
const MAX_JUDGES: usize = 5;
/// Maximum party lines collected from the document header
const MAX_PARTIES: usize = 2;
/// Header window scanned for party lines
const PARTY_SCAN_LINES: usize = 30;
/// Caps on collected statutory references
const MAX_ACTS: usize = 10;
const MAX_SECTIONS: usize = 20;
/// Cap on collected precedent citations
const MAX_PRECEDENTS: usize = 20;

/// Court hierarchy level, derived jointly with the court name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourtLevel {
    #[serde(rename = "Supreme Court")]
    SupremeCourt,
    #[serde(rename = "High Court")]
    HighCourt,
    #[serde(rename = "District Court")]
    DistrictCourt,
}

impl fmt::Display for CourtLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CourtLevel::SupremeCourt => "Supreme Court",
            CourtLevel::HighCourt => "High Court",
            CourtLevel::DistrictCourt => "District Court",
        };
        f.write_str(s)
    }
}

/// Extracted legal metadata.
///
/// Every field is optional: a field that no pattern matched is omitted from
/// the serialized record entirely, so downstream consumers treat a missing
/// key as "unknown", never as an empty placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    /// Primary reporter citation, first pattern match across the ordered rule list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    /// Title-cased court name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_name: Option<String>,
    /// Court level, never present without an accompanying name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_level: Option<CourtLevel>,
    /// Judge names from the CORAM declaration, capped at five
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub judges: Vec<String>,
    /// Number of judges on the bench; absent when no judges were found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bench_strength: Option<usize>,
    /// Decision date normalized to `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<String>,
    /// Raw party lines from the document header, capped at two
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parties: Vec<String>,
    /// Statutes cited, insertion-ordered, capped at ten
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub acts_cited: Vec<String>,
    /// Sections and articles cited, insertion-ordered, capped at twenty
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sections_cited: Vec<String>,
    /// Precedent citations referenced, deduplicated, capped at twenty
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub precedents_cited: Vec<String>,
}

/// Result of a full extraction pass
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub metadata: ExtractedMetadata,
    pub segments: Segments,
}

/// Legal metadata extraction engine.
///
/// All patterns are compiled once at construction; extraction itself never
/// fails and performs no I/O.
pub struct LegalMetadataExtractor {
    citation_patterns: Vec<Regex>,
    court_patterns: Vec<Regex>,
    coram_pattern: Regex,
    date_patterns: Vec<Regex>,
    section_pattern: Regex,
    article_pattern: Regex,
    precedent_patterns: Vec<Regex>,
    segmenter: JudgmentSegmenter,
}

impl LegalMetadataExtractor {
    /// Create a new extractor with all patterns compiled
    pub fn new() -> Result<Self> {
        // Ordered by priority: the first pattern that matches anywhere in the
        // text wins, regardless of where later patterns would match.
        let citation_patterns = compile_all(&[
            r"(?i)AIR\s+\d{4}\s+[A-Z]+\s+\d+",
            r"(?i)\(\d{4}\)\s+\d+\s+SCC\s+\d+",
            r"(?i)\d{4}\s+SCC\s+\(\w+\)\s+\d+",
            r"(?i)\d{4}\s+SCR\s+\d+",
        ])?;

        let court_patterns = compile_all(&[
            r"(?i)(SUPREME COURT OF INDIA)",
            r"(?i)(HIGH COURT OF [A-Z\s]+)",
            r"(?i)([A-Z\s]+ HIGH COURT)",
        ])?;

        let coram_pattern = compile(r"(?i)CORAM:\s*([A-Z\s,\.]+?)(?:\n|\r|JUDGMENT)")?;

        let date_patterns = compile_all(&[
            r"(?i)DATED[:\s]+(\d{1,2})[/-](\d{1,2})[/-](\d{4})",
            r"(?i)JUDGMENT\s+DATED[:\s]+(\d{1,2})[/-](\d{1,2})[/-](\d{4})",
        ])?;

        let section_pattern =
            compile(r"(?i)Section\s+(\d+[A-Z]?)\s+(?:of\s+)?(?:the\s+)?([A-Z][A-Za-z\s,]+?(?:Act|Code))")?;
        let article_pattern = compile(r"(?i)Article\s+(\d+[A-Z]?)\s+of\s+(?:the\s+)?Constitution")?;

        let precedent_patterns = compile_all(&[
            r"(?i)AIR\s+\d{4}\s+[A-Z]+\s+\d+",
            r"(?i)\(\d{4}\)\s+\d+\s+SCC\s+\d+",
        ])?;

        Ok(Self {
            citation_patterns,
            court_patterns,
            coram_pattern,
            date_patterns,
            section_pattern,
            article_pattern,
            precedent_patterns,
            segmenter: JudgmentSegmenter::new()?,
        })
    }

    /// Extract the primary reporter citation.
    ///
    /// Patterns are tried in fixed priority order; the first pattern with a
    /// match anywhere in the text supplies the whole matched substring.
    pub fn extract_citation(&self, text: &str) -> Option<String> {
        self.citation_patterns
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().to_string())
    }

    /// Extract court name and level.
    ///
    /// Absence of any court pattern yields `None`; a level is never produced
    /// without its accompanying name.
    pub fn extract_court(&self, text: &str) -> Option<(String, CourtLevel)> {
        for re in &self.court_patterns {
            if let Some(caps) = re.captures(text) {
                let raw = caps.get(1).map(|m| m.as_str())?;
                let name = title_case(raw.trim());
                let upper = name.to_uppercase();
                let level = if upper.contains("SUPREME COURT") {
                    CourtLevel::SupremeCourt
                } else if upper.contains("HIGH COURT") {
                    CourtLevel::HighCourt
                } else {
                    CourtLevel::DistrictCourt
                };
                return Some((name, level));
            }
        }
        None
    }

    /// Extract judge names from the CORAM declaration, capped at five
    pub fn extract_judges(&self, text: &str) -> Vec<String> {
        let Some(caps) = self.coram_pattern.captures(text) else {
            return Vec::new();
        };
        let Some(judges_text) = caps.get(1) else {
            return Vec::new();
        };

        judges_text
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|j| !j.is_empty())
            .take(MAX_JUDGES)
            .map(str::to_string)
            .collect()
    }

    /// Bench strength equals the judge count; absent when no judges were found
    pub fn extract_bench_strength(&self, text: &str) -> Option<usize> {
        let judges = self.extract_judges(text);
        if judges.is_empty() {
            None
        } else {
            Some(judges.len())
        }
    }

    /// Extract the decision date, normalized to `YYYY-MM-DD`.
    ///
    /// Day/month/year patterns are tried in order; the first match wins.
    pub fn extract_decision_date(&self, text: &str) -> Option<String> {
        for re in &self.date_patterns {
            if let Some(caps) = re.captures(text) {
                let day = caps.get(1)?.as_str();
                let month = caps.get(2)?.as_str();
                let year = caps.get(3)?.as_str();
                return Some(format!("{}-{:0>2}-{:0>2}", year, month, day));
            }
        }
        None
    }

    /// Collect up to two party lines from the first thirty lines of the text.
    ///
    /// A line qualifies when it contains "vs", "v." or "versus"
    /// case-insensitively; matched lines are kept verbatim rather than split
    /// into plaintiff/defendant.
    pub fn extract_parties(&self, text: &str) -> Vec<String> {
        let mut parties = Vec::new();

        for line in text.lines().take(PARTY_SCAN_LINES) {
            let lower = line.to_lowercase();
            if lower.contains("vs") || lower.contains("v.") || lower.contains("versus") {
                parties.push(line.trim().to_string());
                if parties.len() >= MAX_PARTIES {
                    break;
                }
            }
        }

        parties
    }

    /// Extract statutes and sections cited.
    ///
    /// Two pattern families are collected: "Section N of <Act|Code>" and
    /// "Article N of Constitution". Duplicates are dropped while preserving
    /// first-occurrence order; acts are capped at ten, sections at twenty.
    pub fn extract_acts_and_sections(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let mut acts = Vec::new();
        let mut sections = Vec::new();

        for caps in self.section_pattern.captures_iter(text) {
            let (Some(number), Some(act)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let act_name = act.as_str().trim().to_string();
            push_unique(&mut acts, act_name.clone());
            push_unique(&mut sections, format!("Section {} of {}", number.as_str(), act_name));
        }

        for caps in self.article_pattern.captures_iter(text) {
            let Some(number) = caps.get(1) else { continue };
            push_unique(&mut sections, format!("Article {} of Constitution", number.as_str()));
            push_unique(&mut acts, "Constitution of India".to_string());
        }

        acts.truncate(MAX_ACTS);
        sections.truncate(MAX_SECTIONS);
        (acts, sections)
    }

    /// Collect all precedent citations referenced in the text.
    ///
    /// Unlike [`extract_citation`](Self::extract_citation), every match of
    /// every pattern is collected, deduplicated in first-occurrence order and
    /// capped at twenty.
    pub fn extract_precedents(&self, text: &str) -> Vec<String> {
        let mut precedents = Vec::new();

        for re in &self.precedent_patterns {
            for m in re.find_iter(text) {
                push_unique(&mut precedents, m.as_str().to_string());
            }
        }

        precedents.truncate(MAX_PRECEDENTS);
        precedents
    }

    /// Run every extraction rule plus segmentation and merge the results.
    ///
    /// Fields that no pattern matched stay absent from the metadata record.
    pub fn extract_all(&self, text: &str) -> ExtractedDocument {
        let court = self.extract_court(text);
        let judges = self.extract_judges(text);
        let bench_strength = if judges.is_empty() {
            None
        } else {
            Some(judges.len())
        };
        let (acts_cited, sections_cited) = self.extract_acts_and_sections(text);

        let metadata = ExtractedMetadata {
            citation: self.extract_citation(text),
            court_name: court.as_ref().map(|(name, _)| name.clone()),
            court_level: court.as_ref().map(|(_, level)| *level),
            judges,
            bench_strength,
            decision_date: self.extract_decision_date(text),
            parties: self.extract_parties(text),
            acts_cited,
            sections_cited,
            precedents_cited: self.extract_precedents(text),
        };

        ExtractedDocument {
            metadata,
            segments: self.segmenter.segment(text),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| RagError::Internal {
        message: format!("Invalid extraction regex '{}': {}", pattern, e),
    })
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// Append a value only if it is not already present (first occurrence wins)
fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Capitalize the first letter of each whitespace-separated word, lowercasing
/// the rest, preserving the original whitespace
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
