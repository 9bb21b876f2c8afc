//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the cache and feed storage contracts used by the pipeline.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories only accept connections opened through `db::open_db*`.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every key is partitioned by `topic_key()`.

use crate::db::DbError;
use crate::model::atom::AtomValidationError;
use crate::model::knowledge::KnowledgeError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod feed_repo;
pub mod knowledge_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for cache and feed persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(AtomValidationError),
    Knowledge(KnowledgeError),
    Db(DbError),
    /// Persisted row could not be decoded into a domain value.
    InvalidData(String),
    Serialization(serde_json::Error),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Knowledge(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Serialization(err) => write!(f, "serialization failed: {err}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Knowledge(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<AtomValidationError> for RepoError {
    fn from(value: AtomValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<KnowledgeError> for RepoError {
    fn from(value: KnowledgeError) -> Self {
        Self::Knowledge(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Partition key of a topic: lowercase with whitespace runs collapsed.
pub fn topic_key(topic: &str) -> String {
    topic
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fails unless migrations ran and every table in `tables` exists.
pub(crate) fn ensure_connection_ready(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    crate::db::ensure_migrated(conn)?;
    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::topic_key;

    #[test]
    fn topic_key_collapses_case_and_whitespace() {
        assert_eq!(topic_key("  Binary   Search\tTree "), "binary search tree");
        assert_eq!(topic_key("Stack"), topic_key("stack"));
    }
}
