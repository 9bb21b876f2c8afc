//! Domain model for concepts, concept knowledge and learning atoms.
//!
//! # Responsibility
//! - Define the typed records that flow between pipeline stages.
//! - Enforce identity invariants at construction instead of at lookup time.
//!
//! # Invariants
//! - Concept identity for caching and curation is the stemmed name.
//! - Every knowledge record carries exactly its type's field contract.

pub mod atom;
pub mod concept;
pub mod knowledge;
