//! # Answer Generation Module
//!
//! ## Purpose
//! Client for the answer-generation collaborator: builds a legal-specific
//! prompt from retrieved context documents, requests a completion from an
//! OpenAI-compatible chat endpoint and extracts which sources the answer
//! actually cited.
//!
//! ## Input/Output Specification
//! - **Input**: User query, ranked context documents with metadata
//! - **Output**: Answer text plus `[n]`-style citations mapped back to the
//!   retrieved documents
//! - **Prompting**: Indian-law research-assistant system prompt with strict
//!   grounding instructions

use crate::config::LlmConfig;
use crate::errors::{RagError, Result};
use crate::vector_store::ScoredPoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// System prompt for legal question answering
const LEGAL_SYSTEM_PROMPT: &str = "You are a legal research assistant specialized in Indian law.
Your task is to answer questions based on the provided legal documents.

Guidelines:
1. Always cite your sources using [number] notation
2. Be precise and accurate with legal terminology
3. If the answer is not in the documents, say so
4. Do not make up information or hallucinate
5. Provide relevant case law and statutory references
6. Format your answer clearly with proper structure";

/// A citation the answer actually used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerCitation {
    /// One-based index into the context documents
    pub index: usize,
    /// Reporter citation of the cited document, if extraction found one
    pub citation: String,
    /// Vector-store id of the cited chunk
    pub document_id: String,
    /// Retrieval score of the cited chunk
    pub score: f32,
}

/// Generated answer with its citations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub citations: Vec<AnswerCitation>,
}

/// Interface to the answer-generation collaborator
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate a grounded answer from the retrieved context
    async fn generate_with_context(
        &self,
        query: &str,
        context_docs: &[ScoredPoint],
    ) -> Result<RagAnswer>;
}

/// OpenAI-compatible chat completions client
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl HttpLlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    /// Request a completion for a single prompt
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let mut request = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.api_url.trim_end_matches('/')
            ))
            .json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| RagError::AnswerGeneration {
            details: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(RagError::AnswerGeneration {
                details: format!("status {}: {}", status, details),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| RagError::AnswerGeneration {
            details: e.to_string(),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RagError::AnswerGeneration {
                details: "completion returned no choices".to_string(),
            })
    }
}

#[async_trait]
impl AnswerGenerator for HttpLlmClient {
    async fn generate_with_context(
        &self,
        query: &str,
        context_docs: &[ScoredPoint],
    ) -> Result<RagAnswer> {
        let prompt = build_context_prompt(query, context_docs);
        let answer = self.generate(&prompt, LEGAL_SYSTEM_PROMPT).await?;
        let citations = extract_citations(&answer, context_docs);

        tracing::info!("Generated answer with {} citations", citations.len());
        Ok(RagAnswer { answer, citations })
    }
}

/// Build the context block and question prompt sent to the model
fn build_context_prompt(query: &str, context_docs: &[ScoredPoint]) -> String {
    let mut context = String::new();
    for (i, doc) in context_docs.iter().enumerate() {
        let citation = doc
            .metadata
            .get("citation")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Document {}", i + 1));
        context.push_str(&format!("[{}] {}\n{}\n\n", i + 1, citation, doc.text));
    }

    format!(
        "Context documents:\n{}\nQuestion: {}\n\n\
         Please provide a comprehensive answer based on the context documents above. \
         Include citations in your answer using [number] notation.",
        context, query
    )
}

/// Map `[n]` markers in the answer back to the retrieved documents
fn extract_citations(answer: &str, context_docs: &[ScoredPoint]) -> Vec<AnswerCitation> {
    context_docs
        .iter()
        .enumerate()
        .filter_map(|(i, doc)| {
            let marker = format!("[{}]", i + 1);
            if answer.contains(&marker) {
                Some(AnswerCitation {
                    index: i + 1,
                    citation: doc
                        .metadata
                        .get("citation")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    document_id: doc.id.clone(),
                    score: doc.score,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn doc(id: &str, citation: Option<&str>, score: f32) -> ScoredPoint {
        let mut metadata = Map::new();
        if let Some(c) = citation {
            metadata.insert("citation".to_string(), Value::String(c.to_string()));
        }
        ScoredPoint {
            id: id.to_string(),
            score,
            text: "the court observed that bail is the rule".to_string(),
            metadata,
        }
    }

    #[test]
    fn prompt_numbers_documents_and_prefers_reporter_citations() {
        let docs = vec![doc("a", Some("AIR 2020 SC 123"), 0.9), doc("b", None, 0.8)];
        let prompt = build_context_prompt("what is the rule on bail?", &docs);
        assert!(prompt.contains("[1] AIR 2020 SC 123"));
        assert!(prompt.contains("[2] Document 2"));
        assert!(prompt.contains("Question: what is the rule on bail?"));
    }

    #[test]
    fn citations_only_for_markers_present_in_answer() {
        let docs = vec![
            doc("a", Some("AIR 2020 SC 123"), 0.9),
            doc("b", Some("(2019) 4 SCC 17"), 0.8),
            doc("c", None, 0.7),
        ];
        let answer = "Bail is the rule [1], as reaffirmed recently [3].";
        let citations = extract_citations(answer, &docs);

        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].index, 1);
        assert_eq!(citations[0].citation, "AIR 2020 SC 123");
        assert_eq!(citations[0].document_id, "a");
        assert_eq!(citations[1].index, 3);
        assert_eq!(citations[1].citation, "");
    }

    #[test]
    fn no_markers_yields_no_citations() {
        let docs = vec![doc("a", Some("AIR 2020 SC 123"), 0.9)];
        assert!(extract_citations("an uncited answer", &docs).is_empty());
    }
}
