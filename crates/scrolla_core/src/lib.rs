//! Core domain logic for scrolla, the topic-to-learning-feed generator.
//! This crate is the single source of truth for feed invariants.

pub mod config;
pub mod db;
pub mod generator;
pub mod intelligence;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod source;
pub mod text;

pub use config::{load_config, load_or_default, ConfigError, GenerationMode, PipelineConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use generator::{
    AtomGenerator, ConceptExtractor, GenerateError, KnowledgeGenerator, OllamaClient,
    RetryPolicy,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::atom::{Atom, AtomDraft, AtomFeed, AtomPlanItem, AtomType, RunId};
pub use model::concept::{Concept, ConceptCandidate, ConceptType};
pub use model::knowledge::{ConceptKnowledge, Knowledge, KnowledgeError};
pub use repo::feed_repo::{FeedRepository, SqliteFeedRepository};
pub use repo::knowledge_repo::{KnowledgeRepository, SqliteKnowledgeRepository};
pub use repo::{RepoError, RepoResult};
pub use service::feed_report::FeedReport;
pub use service::pipeline::{
    EmptyStage, Generators, Pipeline, PipelineError, PipelineOutcome,
};
pub use service::reorder::{reorder_feed, ReorderReport};
pub use source::{FileSource, SourceProvider, SourceRole, StaticSource, UrlSource, WikipediaSource};
pub use text::Text;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
