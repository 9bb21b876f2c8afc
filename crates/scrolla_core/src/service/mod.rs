//! Feed-building services.
//!
//! # Responsibility
//! - Filter extracted concepts and generated atoms.
//! - Plan, curate, reorder and report on atom feeds.
//! - Orchestrate a full topic run over injected collaborators.
//!
//! # Invariants
//! - Validators are pure predicates; rejection is not an error.
//! - Only the curator and reorder repair assign atom `order`.

pub mod atom_curator;
pub mod atom_planner;
pub mod atom_validator;
pub mod concept_validator;
pub mod feed_report;
pub mod pipeline;
pub mod reorder;
