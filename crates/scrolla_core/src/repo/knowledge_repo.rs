//! Concept knowledge cache contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist structured knowledge per (topic, stemmed concept name).
//! - Serve cache lookups for the pipeline's cache-first resolution.
//!
//! # Invariants
//! - A save whose concept stems equal to an existing one replaces that
//!   record in place; the original list position is kept.
//! - A save with a new stem appends after every existing record.
//! - Rows that fail to decode surface as `RepoError::InvalidData`.

use crate::model::concept::ConceptType;
use crate::model::knowledge::{ConceptKnowledge, Knowledge, KnowledgeError};
use crate::repo::{ensure_connection_ready, topic_key, RepoError, RepoResult};
use crate::text::stem;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

const KNOWLEDGE_SELECT_SQL: &str = "SELECT
    concept,
    type,
    knowledge_json
FROM concept_knowledge";

/// Knowledge cache keyed by topic and stemmed concept name.
pub trait KnowledgeRepository {
    /// Returns the record whose concept stems equal to `concept`.
    fn load(&self, topic: &str, concept: &str) -> RepoResult<Option<ConceptKnowledge>>;
    /// Upserts `knowledge` for `topic`.
    fn save(&self, topic: &str, knowledge: &ConceptKnowledge) -> RepoResult<()>;
    /// Every record of `topic` in list order.
    fn list(&self, topic: &str) -> RepoResult<Vec<ConceptKnowledge>>;
}

/// SQLite-backed knowledge cache.
pub struct SqliteKnowledgeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKnowledgeRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `RepoError::Db(DbError::UninitializedConnection)` when migrations
    ///   were not applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["concept_knowledge"])?;
        Ok(Self { conn })
    }
}

impl KnowledgeRepository for SqliteKnowledgeRepository<'_> {
    fn load(&self, topic: &str, concept: &str) -> RepoResult<Option<ConceptKnowledge>> {
        let topic_key = topic_key(topic);
        let concept_key = stem(concept);
        let record = self
            .conn
            .query_row(
                &format!(
                    "{KNOWLEDGE_SELECT_SQL}
                     WHERE topic_key = ?1 AND concept_key = ?2;"
                ),
                params![topic_key, concept_key],
                |row| Ok(parse_row(row)),
            )
            .optional()?
            .transpose()?;

        debug!(
            "event=knowledge_cache_lookup module=repo topic_key=\"{}\" concept_key=\"{}\" hit={}",
            topic_key,
            concept_key,
            record.is_some()
        );
        Ok(record)
    }

    fn save(&self, topic: &str, knowledge: &ConceptKnowledge) -> RepoResult<()> {
        let topic_key = topic_key(topic);
        let concept_key = knowledge.identity_key();
        if concept_key.is_empty() {
            return Err(RepoError::Knowledge(KnowledgeError::MissingConcept));
        }
        let knowledge_json =
            serde_json::to_string(&Value::Object(knowledge.knowledge.to_json_map()))?;

        self.conn.execute(
            "INSERT INTO concept_knowledge (
                topic_key,
                concept_key,
                concept,
                type,
                knowledge_json,
                position
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                (SELECT COALESCE(MAX(position), 0) + 1
                 FROM concept_knowledge
                 WHERE topic_key = ?1)
            )
            ON CONFLICT (topic_key, concept_key) DO UPDATE SET
                concept = excluded.concept,
                type = excluded.type,
                knowledge_json = excluded.knowledge_json,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                topic_key,
                concept_key,
                knowledge.concept.as_str(),
                knowledge.concept_type().as_str(),
                knowledge_json,
            ],
        )?;

        debug!(
            "event=knowledge_cache_save module=repo topic_key=\"{}\" concept_key=\"{}\" type={}",
            topic_key,
            concept_key,
            knowledge.concept_type()
        );
        Ok(())
    }

    fn list(&self, topic: &str) -> RepoResult<Vec<ConceptKnowledge>> {
        let mut stmt = self.conn.prepare(&format!(
            "{KNOWLEDGE_SELECT_SQL}
             WHERE topic_key = ?1
             ORDER BY position ASC;"
        ))?;
        let mut rows = stmt.query([topic_key(topic)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_row(row)?);
        }
        Ok(records)
    }
}

fn parse_row(row: &Row<'_>) -> RepoResult<ConceptKnowledge> {
    let concept: String = row.get("concept")?;
    let type_text: String = row.get("type")?;
    let kind = ConceptType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid concept type `{type_text}` in concept_knowledge.type"
        ))
    })?;

    let json_text: String = row.get("knowledge_json")?;
    let object = match serde_json::from_str::<Value>(&json_text) {
        Ok(Value::Object(object)) => object,
        Ok(_) | Err(_) => {
            return Err(RepoError::InvalidData(format!(
                "knowledge for `{concept}` is not a JSON object in concept_knowledge.knowledge_json"
            )));
        }
    };
    let knowledge = Knowledge::from_json_map(kind, object)
        .map_err(|err| RepoError::InvalidData(format!("knowledge for `{concept}`: {err}")))?;

    Ok(ConceptKnowledge::try_new(concept, knowledge)?)
}

#[cfg(test)]
mod tests {
    use super::{KnowledgeRepository, SqliteKnowledgeRepository};
    use crate::db::open_db_in_memory;
    use crate::model::concept::ConceptType;
    use crate::model::knowledge::{ConceptKnowledge, Knowledge};
    use crate::repo::RepoError;
    use crate::text::Text;

    fn definition(name: &str, what: &str) -> ConceptKnowledge {
        let mut knowledge = Knowledge::empty(ConceptType::Definition);
        *knowledge.field_mut("what_it_is").unwrap() = Some(Text::from(what));
        ConceptKnowledge::try_new(name, knowledge).unwrap()
    }

    #[test]
    fn corrupt_row_is_reported_not_masked() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO concept_knowledge (topic_key, concept_key, concept, type, knowledge_json, position)
             VALUES ('stack', 'push', 'Push', 'Operation', '{\"summary\": \"x\"}', 1);",
            [],
        )
        .unwrap();

        let repo = SqliteKnowledgeRepository::try_new(&conn).unwrap();
        let err = repo.load("Stack", "Push").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn stem_equal_save_keeps_list_position() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKnowledgeRepository::try_new(&conn).unwrap();

        repo.save("Stack", &definition("Insertion", "first")).unwrap();
        repo.save("Stack", &definition("Stack Frame", "second")).unwrap();
        repo.save("Stack", &definition("Insert", "replaced")).unwrap();

        let names: Vec<String> = repo
            .list("stack")
            .unwrap()
            .into_iter()
            .map(|record| record.concept)
            .collect();
        assert_eq!(names, vec!["Insert".to_string(), "Stack Frame".to_string()]);
    }

    #[test]
    fn saving_the_same_concept_twice_updates_one_row_in_place() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKnowledgeRepository::try_new(&conn).unwrap();

        repo.save("Stack", &definition("Stack", "original")).unwrap();
        repo.save("Stack", &definition("Stack Push", "second")).unwrap();
        repo.save("Stack", &definition("Stack", "rewritten")).unwrap();

        let (rows, position): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), MIN(position) FROM concept_knowledge
                 WHERE topic_key = 'stack' AND concept_key = 'stack';",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(position, 1);

        let stored = repo.load("Stack", "Stack").unwrap().unwrap();
        let what = stored
            .knowledge
            .fields()
            .into_iter()
            .find(|(field, _)| *field == "what_it_is")
            .and_then(|(_, value)| value.cloned());
        assert_eq!(what, Some(Text::from("rewritten")));
        assert_eq!(repo.list("Stack").unwrap()[0].concept, "Stack");
    }
}
