//! Generative-model collaborators.
//!
//! # Responsibility
//! - Define the extraction, knowledge and atom generation contracts.
//! - Provide the retry policy applied to external calls.
//! - Provide the Ollama-backed implementation of every contract.
//!
//! # Invariants
//! - Only `GenerateError::Timeout` is retried.
//! - Replies are parsed leniently; a reply no strategy can read is
//!   `GenerateError::Malformed`.

pub mod ollama;
pub mod prompt;
pub mod retry;
pub mod traits;

pub use ollama::OllamaClient;
pub use retry::RetryPolicy;
pub use traits::{AtomGenerator, ConceptExtractor, GenerateError, KnowledgeGenerator};
