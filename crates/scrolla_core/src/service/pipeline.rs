//! Topic-to-feed pipeline orchestration.
//!
//! # Responsibility
//! - Drive sources, extraction, knowledge resolution, optional intelligence,
//!   atom generation, validation, curation and persistence for one topic.
//! - Isolate per-concept and per-atom generator failures.
//!
//! # Invariants
//! - Raw source text is archived before extraction starts.
//! - Knowledge is resolved cache-first; the generator runs only on a miss.
//! - A generated record is saved before it joins the in-memory list.
//! - Store failures abort the run; generator failures skip one item.
//! - An empty result is `PipelineOutcome::NothingProduced`, never an error.

use crate::config::{GenerationMode, PipelineSettings};
use crate::generator::{AtomGenerator, ConceptExtractor, GenerateError, KnowledgeGenerator};
use crate::intelligence::IntelligenceEngine;
use crate::model::atom::{Atom, AtomFeed, AtomType, RunId};
use crate::model::concept::Concept;
use crate::model::knowledge::ConceptKnowledge;
use crate::repo::feed_repo::FeedRepository;
use crate::repo::knowledge_repo::KnowledgeRepository;
use crate::repo::RepoError;
use crate::service::atom_curator::curate_feed;
use crate::service::atom_planner::plan_atoms;
use crate::service::atom_validator::rejection_reason;
use crate::service::concept_validator::{knowledge_is_acceptable, validate_concepts};
use crate::source::{build_merged_context, fetch_all, SourceProvider};
use crate::text::{strip_answer_leak, NormalizeMode, Text};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Stage at which a run ran out of material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyStage {
    NoConcepts,
    NoKnowledge,
    NoAtoms,
}

impl EmptyStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoConcepts => "no_concepts",
            Self::NoKnowledge => "no_knowledge",
            Self::NoAtoms => "no_atoms",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed {
        feed: AtomFeed,
        /// Concepts dropped because knowledge or atoms could not be generated.
        skipped_concepts: Vec<String>,
        run_id: RunId,
    },
    NothingProduced {
        stage: EmptyStage,
    },
}

#[derive(Debug)]
pub enum PipelineError {
    Repo(RepoError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "pipeline storage failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for PipelineError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Model-backed collaborators. One client may fill every slot.
pub struct Generators<'a> {
    pub extractor: &'a dyn ConceptExtractor,
    pub knowledge: &'a dyn KnowledgeGenerator,
    pub atoms: &'a dyn AtomGenerator,
}

/// Orchestrates one topic run over injected collaborators and stores.
pub struct Pipeline<'a, K: KnowledgeRepository, F: FeedRepository> {
    generators: Generators<'a>,
    sources: Vec<Box<dyn SourceProvider>>,
    knowledge_repo: K,
    feed_repo: F,
    settings: PipelineSettings,
}

impl<'a, K: KnowledgeRepository, F: FeedRepository> Pipeline<'a, K, F> {
    pub fn new(
        generators: Generators<'a>,
        sources: Vec<Box<dyn SourceProvider>>,
        knowledge_repo: K,
        feed_repo: F,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            generators,
            sources,
            knowledge_repo,
            feed_repo,
            settings,
        }
    }

    /// Runs every stage for `topic`.
    ///
    /// # Errors
    /// - `PipelineError::Repo` when a store read or write fails.
    pub fn run(&self, topic: &str) -> PipelineResult<PipelineOutcome> {
        let started_at = Instant::now();
        let run_id = Uuid::new_v4();
        info!(
            "event=pipeline_run module=service status=start topic=\"{}\" run_id={}",
            topic, run_id
        );

        let fetched = fetch_all(&self.sources, topic);
        self.feed_repo.save_raw_sources(topic, &fetched)?;
        let context = build_merged_context(&fetched);

        let concepts = self.extract(topic, &context);
        if concepts.is_empty() {
            return Ok(nothing_produced(topic, EmptyStage::NoConcepts));
        }
        self.feed_repo.save_concepts(topic, &concepts)?;

        let mut skipped_concepts = Vec::new();
        let mut records = Vec::new();
        for concept in &concepts {
            match self.resolve_knowledge(topic, concept, &context)? {
                Some(record) => records.push(record),
                None => skipped_concepts.push(concept.name.clone()),
            }
        }
        if records.is_empty() {
            return Ok(nothing_produced(topic, EmptyStage::NoKnowledge));
        }

        if self.settings.use_intelligence {
            records = IntelligenceEngine::new(self.settings.max_concepts).run(records);
        }

        let mut atoms = Vec::new();
        for record in &records {
            match self.generate_atoms(topic, record) {
                Ok(generated) => atoms.extend(generated),
                Err(err) => {
                    warn!(
                        "event=atom_generate module=service status=skip concept=\"{}\" error={}",
                        record.concept, err
                    );
                    skipped_concepts.push(record.concept.clone());
                }
            }
        }

        let generated_count = atoms.len();
        if self.settings.validate_atoms {
            atoms.retain(|atom| match rejection_reason(atom) {
                Some(reason) => {
                    debug!(
                        "event=atom_validate module=service status=skip concept=\"{}\" atom_type={} reason={}",
                        atom.concept,
                        atom.atom_type,
                        reason.as_str()
                    );
                    false
                }
                None => true,
            });
        }
        if atoms.is_empty() {
            return Ok(nothing_produced(topic, EmptyStage::NoAtoms));
        }

        let feed = curate_feed(AtomFeed::new(topic, atoms));
        self.feed_repo.save_feed(&feed, Some(run_id))?;

        info!(
            "event=pipeline_run module=service status=ok topic=\"{}\" run_id={} concepts={} generated={} kept={} skipped={} duration_ms={}",
            topic,
            run_id,
            records.len(),
            generated_count,
            feed.len(),
            skipped_concepts.len(),
            started_at.elapsed().as_millis()
        );
        Ok(PipelineOutcome::Completed {
            feed,
            skipped_concepts,
            run_id,
        })
    }

    fn extract(&self, topic: &str, context: &str) -> Vec<Concept> {
        let candidates = match self.generators.extractor.extract_concepts(topic, context) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(
                    "event=extract_concepts module=service status=error topic=\"{}\" error={}",
                    topic, err
                );
                Vec::new()
            }
        };
        let concepts = validate_concepts(&candidates, topic);
        info!(
            "event=concept_validate module=service status=ok candidates={} accepted={}",
            candidates.len(),
            concepts.len()
        );
        concepts
    }

    /// Cached record, or a freshly generated one saved before returning.
    /// `Ok(None)` means the generator failed and the concept is skipped.
    fn resolve_knowledge(
        &self,
        topic: &str,
        concept: &Concept,
        context: &str,
    ) -> PipelineResult<Option<ConceptKnowledge>> {
        if let Some(cached) = self.knowledge_repo.load(topic, &concept.name)? {
            debug!(
                "event=knowledge_resolve module=service status=ok source=cache concept=\"{}\"",
                concept.name
            );
            return Ok(Some(cached));
        }

        let generated = match self
            .generators
            .knowledge
            .generate_knowledge(topic, concept, context)
        {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "event=knowledge_resolve module=service status=skip concept=\"{}\" error={}",
                    concept.name, err
                );
                return Ok(None);
            }
        };

        if !knowledge_is_acceptable(&generated, topic) {
            warn!(
                "event=knowledge_quality module=service status=warn concept=\"{}\" filled={}",
                generated.concept,
                generated.knowledge.filled_count()
            );
        }
        // Why: persist before handing the record on so a later failure in
        // this run never pays for the same generator call twice.
        self.knowledge_repo.save(topic, &generated)?;
        debug!(
            "event=knowledge_resolve module=service status=ok source=generator concept=\"{}\"",
            generated.concept
        );
        Ok(Some(generated))
    }

    fn generate_atoms(
        &self,
        topic: &str,
        record: &ConceptKnowledge,
    ) -> Result<Vec<Atom>, GenerateError> {
        match self.settings.generation_mode {
            GenerationMode::Bundle => {
                let drafts = self.generators.atoms.generate_atom_drafts(topic, record)?;
                Ok(drafts
                    .into_iter()
                    .filter_map(|draft| {
                        draft_to_atom(topic, &record.concept, draft.atom_type, &draft.content)
                    })
                    .collect())
            }
            GenerationMode::Planned => {
                let mut atoms = Vec::new();
                for item in plan_atoms(&record.concept, record.concept_type()) {
                    match self.generators.atoms.generate_atom_draft(topic, &item, record) {
                        Ok(content) => atoms.extend(draft_to_atom(
                            topic,
                            &record.concept,
                            item.atom_type,
                            &content,
                        )),
                        Err(err) => warn!(
                            "event=atom_generate module=service status=skip concept=\"{}\" atom_type={} error={}",
                            record.concept, item.atom_type, err
                        ),
                    }
                }
                Ok(atoms)
            }
        }
    }
}

fn nothing_produced(topic: &str, stage: EmptyStage) -> PipelineOutcome {
    warn!(
        "event=pipeline_run module=service status=empty topic=\"{}\" stage={}",
        topic,
        stage.as_str()
    );
    PipelineOutcome::NothingProduced { stage }
}

/// Flattens generated content into an atom; blank content yields nothing.
fn draft_to_atom(topic: &str, concept: &str, atom_type: AtomType, content: &Text) -> Option<Atom> {
    let flat = content.normalize(NormalizeMode::Generation);
    let flat = if atom_type.is_quiz() {
        strip_answer_leak(&flat)
    } else {
        flat.trim().to_string()
    };
    if flat.is_empty() {
        return None;
    }
    Some(Atom::new(topic, concept, atom_type, flat))
}

#[cfg(test)]
mod tests {
    use super::draft_to_atom;
    use crate::model::atom::AtomType;
    use crate::text::Text;

    #[test]
    fn quiz_drafts_lose_leaked_answers() {
        let atom = draft_to_atom(
            "Stack",
            "Push",
            AtomType::QuickCheck,
            &Text::from("Does push add to the top? Answer: yes"),
        )
        .unwrap();
        assert_eq!(atom.content, "Does push add to the top?");
        assert_eq!(atom.order, 0);
    }

    #[test]
    fn list_drafts_flatten_and_blank_drafts_vanish() {
        let atom = draft_to_atom(
            "Stack",
            "Push",
            AtomType::KeyPoints,
            &Text::Lines(vec!["LIFO order".into(), " ".into(), "O(1) push".into()]),
        )
        .unwrap();
        assert_eq!(atom.content, "LIFO order\nO(1) push");
        assert!(draft_to_atom("Stack", "Push", AtomType::Example, &Text::from("  ")).is_none());
    }
}
