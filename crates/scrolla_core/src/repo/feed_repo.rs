//! Per-topic semantic concept list and curated atom feed storage.
//!
//! # Responsibility
//! - Replace a topic's validated concept list in one transaction.
//! - Replace a topic's curated feed in one transaction.
//! - Archive the non-empty raw source text behind a topic's latest run.
//!
//! # Invariants
//! - Feed writes validate every atom and the dense `1..=len` order first.
//! - Loaded feeds come back in `order` and are re-validated.

use crate::model::atom::{Atom, AtomFeed, AtomType, RunId};
use crate::model::concept::{Concept, ConceptType};
use crate::repo::{ensure_connection_ready, topic_key, RepoError, RepoResult};
use crate::source::{SourceRole, SourceText};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

/// Storage for the pipeline's per-topic artifacts.
pub trait FeedRepository {
    fn save_concepts(&self, topic: &str, concepts: &[Concept]) -> RepoResult<()>;
    fn load_concepts(&self, topic: &str) -> RepoResult<Vec<Concept>>;
    /// Replaces the topic's feed; `run_id` records which run produced it.
    fn save_feed(&self, feed: &AtomFeed, run_id: Option<RunId>) -> RepoResult<()>;
    fn load_feed(&self, topic: &str) -> RepoResult<Option<AtomFeed>>;
    /// Replaces the topic's archived source text; empty texts are skipped.
    fn save_raw_sources(&self, topic: &str, sources: &[SourceText]) -> RepoResult<()>;
    fn load_raw_sources(&self, topic: &str) -> RepoResult<Vec<SourceText>>;
}

/// SQLite-backed feed store.
pub struct SqliteFeedRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFeedRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["semantic_concepts", "atom_feeds", "feed_atoms", "raw_sources"],
        )?;
        Ok(Self { conn })
    }
}

impl FeedRepository for SqliteFeedRepository<'_> {
    fn save_concepts(&self, topic: &str, concepts: &[Concept]) -> RepoResult<()> {
        let topic_key = topic_key(topic);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM semantic_concepts WHERE topic_key = ?1;",
            [&topic_key],
        )?;
        for (index, concept) in concepts.iter().enumerate() {
            tx.execute(
                "INSERT INTO semantic_concepts (topic_key, position, concept, type)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    topic_key,
                    index as i64 + 1,
                    concept.name.as_str(),
                    concept.kind.as_str()
                ],
            )?;
        }
        tx.commit()?;

        info!(
            "event=semantic_concepts_save module=repo status=ok topic_key=\"{}\" count={}",
            topic_key,
            concepts.len()
        );
        Ok(())
    }

    fn load_concepts(&self, topic: &str) -> RepoResult<Vec<Concept>> {
        let mut stmt = self.conn.prepare(
            "SELECT concept, type
             FROM semantic_concepts
             WHERE topic_key = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([topic_key(topic)])?;
        let mut concepts = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let type_text: String = row.get(1)?;
            let kind = ConceptType::parse(&type_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid concept type `{type_text}` in semantic_concepts.type"
                ))
            })?;
            concepts.push(Concept::new(name, kind));
        }
        Ok(concepts)
    }

    fn save_feed(&self, feed: &AtomFeed, run_id: Option<RunId>) -> RepoResult<()> {
        for atom in &feed.atoms {
            atom.validate()?;
        }
        feed.validate_order()?;

        let topic_key = topic_key(&feed.topic);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM feed_atoms WHERE topic_key = ?1;", [&topic_key])?;
        tx.execute(
            "INSERT INTO atom_feeds (topic_key, topic, run_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (topic_key) DO UPDATE SET
                topic = excluded.topic,
                run_id = excluded.run_id,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                topic_key,
                feed.topic.as_str(),
                run_id.map(|id| id.to_string())
            ],
        )?;
        for atom in &feed.atoms {
            tx.execute(
                "INSERT INTO feed_atoms (
                    topic_key,
                    ord,
                    concept,
                    atom_type,
                    content,
                    difficulty,
                    read_time_sec
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    topic_key,
                    i64::from(atom.order),
                    atom.concept.as_str(),
                    atom.atom_type.as_str(),
                    atom.content.as_str(),
                    atom.difficulty.as_str(),
                    i64::from(atom.estimated_read_time_sec),
                ],
            )?;
        }
        tx.commit()?;

        info!(
            "event=feed_save module=repo status=ok topic_key=\"{}\" atoms={}",
            topic_key,
            feed.len()
        );
        Ok(())
    }

    fn load_feed(&self, topic: &str) -> RepoResult<Option<AtomFeed>> {
        let topic_key = topic_key(topic);
        let stored_topic: Option<String> = self
            .conn
            .query_row(
                "SELECT topic FROM atom_feeds WHERE topic_key = ?1;",
                [&topic_key],
                |row| row.get(0),
            )
            .optional()?;
        let Some(stored_topic) = stored_topic else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT ord, concept, atom_type, content, difficulty, read_time_sec
             FROM feed_atoms
             WHERE topic_key = ?1
             ORDER BY ord ASC;",
        )?;
        let mut rows = stmt.query([&topic_key])?;
        let mut atoms = Vec::new();
        while let Some(row) = rows.next()? {
            atoms.push(parse_atom_row(row, &stored_topic)?);
        }

        let feed = AtomFeed::new(stored_topic, atoms);
        feed.validate_order()
            .map_err(|err| RepoError::InvalidData(format!("feed_atoms.ord: {err}")))?;
        Ok(Some(feed))
    }

    fn save_raw_sources(&self, topic: &str, sources: &[SourceText]) -> RepoResult<()> {
        let topic_key = topic_key(topic);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM raw_sources WHERE topic_key = ?1;", [&topic_key])?;
        let mut stored = 0_i64;
        for source in sources.iter().filter(|source| !source.text.is_empty()) {
            stored += 1;
            tx.execute(
                "INSERT INTO raw_sources (topic_key, position, source, role, raw_text)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    topic_key,
                    stored,
                    source.name.as_str(),
                    source.role.as_str(),
                    source.text.as_str()
                ],
            )?;
        }
        tx.commit()?;

        info!(
            "event=raw_sources_save module=repo status=ok topic_key=\"{}\" count={}",
            topic_key, stored
        );
        Ok(())
    }

    fn load_raw_sources(&self, topic: &str) -> RepoResult<Vec<SourceText>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, role, raw_text
             FROM raw_sources
             WHERE topic_key = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([topic_key(topic)])?;
        let mut sources = Vec::new();
        while let Some(row) = rows.next()? {
            let role_text: String = row.get(1)?;
            let role = SourceRole::parse(&role_text).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid role `{role_text}` in raw_sources.role"))
            })?;
            sources.push(SourceText {
                name: row.get(0)?,
                role,
                text: row.get(2)?,
            });
        }
        Ok(sources)
    }
}

fn parse_atom_row(row: &Row<'_>, topic: &str) -> RepoResult<Atom> {
    let order = u32::try_from(row.get::<_, i64>("ord")?)
        .map_err(|_| RepoError::InvalidData("negative value in feed_atoms.ord".to_string()))?;
    let read_time = u32::try_from(row.get::<_, i64>("read_time_sec")?).map_err(|_| {
        RepoError::InvalidData("negative value in feed_atoms.read_time_sec".to_string())
    })?;
    let atom_type: String = row.get("atom_type")?;

    let atom = Atom {
        topic: topic.to_string(),
        concept: row.get("concept")?,
        atom_type: AtomType::parse(&atom_type),
        content: row.get("content")?,
        difficulty: row.get("difficulty")?,
        estimated_read_time_sec: read_time,
        order,
    };
    atom.validate()?;
    Ok(atom)
}
