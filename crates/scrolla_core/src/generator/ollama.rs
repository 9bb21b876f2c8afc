//! Ollama HTTP client implementing every generator contract.
//!
//! # Responsibility
//! - Send prompts to an Ollama `generate` endpoint and read the reply text.
//! - Turn replies into candidates, knowledge and atom drafts.
//!
//! # Invariants
//! - Each request is bounded by the configured timeout.
//! - The reply `response` field is read leniently: list replies are joined,
//!   null or non-text replies become empty text.

use super::prompt;
use super::retry::RetryPolicy;
use super::traits::{AtomGenerator, ConceptExtractor, GenerateError, KnowledgeGenerator};
use crate::model::atom::{AtomDraft, AtomPlanItem, AtomType};
use crate::model::concept::{Concept, ConceptCandidate};
use crate::model::knowledge::ConceptKnowledge;
use crate::text::{normalize_value, parse_lenient, NormalizeMode, Strictness, Text};
use log::{debug, info, warn};
use reqwest::blocking::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
/// Extraction reads the merged text in chunks of this many characters.
pub const EXTRACTION_CHUNK_CHARS: usize = 2000;
/// Extraction stops once this many unique candidates are collected.
pub const MAX_EXTRACTED_CONCEPTS: usize = 20;

pub struct OllamaClient {
    endpoint: String,
    model: String,
    http: HttpClient,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, GenerateError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GenerateError::Http(format!("cannot build HTTP client: {err}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            http,
            retry,
        })
    }

    /// Sends `prompt` and returns the reply text, retrying timeouts.
    pub fn complete(&self, operation: &str, prompt: &str) -> Result<String, GenerateError> {
        self.retry
            .run(operation, |attempt| self.complete_once(operation, prompt, attempt))
    }

    fn complete_once(
        &self,
        operation: &str,
        prompt: &str,
        attempt: u32,
    ) -> Result<String, GenerateError> {
        let started_at = Instant::now();
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(map_transport_error)?;
        let body: Value = response.json().map_err(map_transport_error)?;

        let text = normalize_value(
            body.get("response").unwrap_or(&Value::Null),
            NormalizeMode::Generation,
            Strictness::Lenient,
        )?;

        debug!(
            "event=generator_call module=generator status=ok operation={} model={} attempt={} duration_ms={} reply_chars={}",
            operation,
            self.model,
            attempt,
            started_at.elapsed().as_millis(),
            text.chars().count()
        );
        Ok(text)
    }
}

fn map_transport_error(err: reqwest::Error) -> GenerateError {
    if err.is_timeout() {
        GenerateError::Timeout { attempts: 1 }
    } else {
        GenerateError::Http(err.to_string())
    }
}

impl KnowledgeGenerator for OllamaClient {
    fn generate_knowledge(
        &self,
        topic: &str,
        concept: &Concept,
        context: &str,
    ) -> Result<ConceptKnowledge, GenerateError> {
        let reply = self.complete(
            "knowledge",
            &prompt::knowledge_prompt(topic, concept, context),
        )?;
        let value = parse_lenient(&reply)?;
        Ok(ConceptKnowledge::from_reply(&value, concept)?)
    }
}

impl AtomGenerator for OllamaClient {
    fn generate_atom_drafts(
        &self,
        topic: &str,
        knowledge: &ConceptKnowledge,
    ) -> Result<Vec<AtomDraft>, GenerateError> {
        let reply = self.complete("atom_bundle", &prompt::atom_bundle_prompt(topic, knowledge))?;
        drafts_from_reply(&parse_lenient(&reply)?)
    }

    fn generate_atom_draft(
        &self,
        _topic: &str,
        item: &AtomPlanItem,
        knowledge: &ConceptKnowledge,
    ) -> Result<Text, GenerateError> {
        let reply = self.complete("atom", &prompt::atom_prompt(item, knowledge))?;
        Ok(Text::Plain(reply))
    }
}

impl ConceptExtractor for OllamaClient {
    fn extract_concepts(
        &self,
        topic: &str,
        text: &str,
    ) -> Result<Vec<ConceptCandidate>, GenerateError> {
        let mut seen = HashSet::new();
        let mut collected = Vec::new();

        for (index, chunk) in chunk_chars(text, EXTRACTION_CHUNK_CHARS).enumerate() {
            let candidates = self
                .complete("extract", &prompt::extraction_prompt(topic, chunk))
                .and_then(|reply| parse_lenient(&reply).map_err(GenerateError::from))
                .map(|value| candidates_from_reply(&value));
            match candidates {
                Ok(candidates) => {
                    for candidate in candidates {
                        if seen.insert((candidate.name.to_lowercase(), candidate.kind.clone())) {
                            collected.push(candidate);
                        }
                    }
                }
                Err(err) => warn!(
                    "event=extract_chunk module=generator status=skip chunk={} error={}",
                    index + 1,
                    err
                ),
            }
            if collected.len() >= MAX_EXTRACTED_CONCEPTS {
                break;
            }
        }

        collected.truncate(MAX_EXTRACTED_CONCEPTS);
        info!(
            "event=extract_concepts module=generator status=ok candidates={}",
            collected.len()
        );
        Ok(collected)
    }
}

/// Splits `text` into pieces of at most `size` characters.
fn chunk_chars(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let size = size.max(1);
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let split = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(index, _)| index);
        let (chunk, tail) = rest.split_at(split);
        rest = tail;
        Some(chunk)
    })
}

/// Reads `{"concepts": [...]}` or a bare list; unreadable items are skipped.
fn candidates_from_reply(value: &Value) -> Vec<ConceptCandidate> {
    let items: &[Value] = match value {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("concepts") {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        _ => &[],
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<ConceptCandidate>(item.clone()).ok())
        .filter(|candidate| !candidate.name.trim().is_empty())
        .collect()
}

/// Reads a list of `{atom_type, content}` objects, or `{"atoms": [...]}`.
fn drafts_from_reply(value: &Value) -> Result<Vec<AtomDraft>, GenerateError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("atoms") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(GenerateError::Malformed(
                    "atom bundle is not a list".to_string(),
                ))
            }
        },
        _ => {
            return Err(GenerateError::Malformed(
                "atom bundle is not a list".to_string(),
            ))
        }
    };

    let drafts = items
        .iter()
        .filter_map(|item| {
            let atom_type = item.get("atom_type")?.as_str()?;
            let content = item
                .get("content")
                .and_then(Text::from_value)
                .unwrap_or_else(|| Text::Plain(String::new()));
            Some(AtomDraft {
                atom_type: AtomType::parse(atom_type),
                content,
            })
        })
        .collect();
    Ok(drafts)
}
