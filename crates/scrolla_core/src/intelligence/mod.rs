//! Concept intelligence: dedupe, rank and select resolved knowledge.
//!
//! # Responsibility
//! - Collapse near-duplicate concepts into one merged knowledge record.
//! - Score concepts by graph centrality, knowledge density and type.
//! - Select a bounded learning set for atom generation.
//!
//! # Invariants
//! - Every pass is deterministic for a given input order.
//! - Input order breaks every tie.
//!
//! # See also
//! - `service::pipeline` for where the engine runs.

pub mod cluster;
pub mod embed;
pub mod engine;
pub mod graph;
pub mod score;

pub use cluster::{cluster_by_distance, DEFAULT_DISTANCE_THRESHOLD};
pub use embed::{cosine_similarity, NameEmbedder, NgramEmbedder};
pub use engine::{select_learning_concepts, IntelligenceEngine, ScoredKnowledge};
pub use graph::ConceptGraph;
