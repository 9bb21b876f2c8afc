//! Collaborator contracts for model-backed generation.

use crate::model::atom::{AtomDraft, AtomPlanItem};
use crate::model::concept::{Concept, ConceptCandidate};
use crate::model::knowledge::{ConceptKnowledge, KnowledgeError};
use crate::text::{Text, TextError};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum GenerateError {
    /// The external call did not answer in time, after every attempt.
    Timeout { attempts: u32 },
    /// Transport failure or non-success status.
    Http(String),
    /// Reply could not be read as the expected structure.
    Malformed(String),
    /// Reply was readable but violated a domain invariant.
    Invariant(KnowledgeError),
}

impl GenerateError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { attempts } => {
                write!(f, "generator timed out after {attempts} attempt(s)")
            }
            Self::Http(message) => write!(f, "generator request failed: {message}"),
            Self::Malformed(message) => write!(f, "malformed generator reply: {message}"),
            Self::Invariant(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GenerateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invariant(err) => Some(err),
            Self::Timeout { .. } | Self::Http(_) | Self::Malformed(_) => None,
        }
    }
}

impl From<KnowledgeError> for GenerateError {
    fn from(value: KnowledgeError) -> Self {
        Self::Invariant(value)
    }
}

impl From<TextError> for GenerateError {
    fn from(value: TextError) -> Self {
        Self::Malformed(value.to_string())
    }
}

/// Produces structured knowledge for one concept.
pub trait KnowledgeGenerator {
    fn generate_knowledge(
        &self,
        topic: &str,
        concept: &Concept,
        context: &str,
    ) -> Result<ConceptKnowledge, GenerateError>;
}

/// Produces atom content from concept knowledge.
pub trait AtomGenerator {
    /// One call yielding every atom for a concept.
    fn generate_atom_drafts(
        &self,
        topic: &str,
        knowledge: &ConceptKnowledge,
    ) -> Result<Vec<AtomDraft>, GenerateError>;

    /// One call yielding the content of a single planned atom.
    fn generate_atom_draft(
        &self,
        topic: &str,
        item: &AtomPlanItem,
        knowledge: &ConceptKnowledge,
    ) -> Result<Text, GenerateError>;
}

/// Pulls concept candidates out of free text.
pub trait ConceptExtractor {
    fn extract_concepts(
        &self,
        topic: &str,
        text: &str,
    ) -> Result<Vec<ConceptCandidate>, GenerateError>;
}
