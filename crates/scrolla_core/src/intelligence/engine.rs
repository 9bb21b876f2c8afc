//! Cluster, score, merge and select concept knowledge.
//!
//! # Responsibility
//! - Run the intelligence passes end to end over resolved knowledge.
//!
//! # Invariants
//! - A merged record keeps the identity of its top-scored member.
//! - Backfill only fills unfilled fields of the base's own contract; the
//!   first member to supply a field wins.
//! - Selection admits at most one `Application` concept.

use super::cluster::{cluster_by_distance, DEFAULT_DISTANCE_THRESHOLD};
use super::embed::{NameEmbedder, NgramEmbedder};
use super::graph::ConceptGraph;
use super::score::score;
use crate::model::concept::ConceptType;
use crate::model::knowledge::ConceptKnowledge;
use crate::text::Text;
use log::{debug, info};
use std::cmp::Ordering;

pub const DEFAULT_MAX_CONCEPTS: usize = 10;
const MAX_APPLICATIONS: usize = 1;

/// Knowledge record with its score and original input position.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKnowledge {
    pub knowledge: ConceptKnowledge,
    pub score: f32,
    pub index: usize,
}

/// Runs clustering, scoring, merging and selection.
pub struct IntelligenceEngine<E = NgramEmbedder> {
    embedder: E,
    distance_threshold: f32,
    max_concepts: usize,
}

impl IntelligenceEngine<NgramEmbedder> {
    pub fn new(max_concepts: usize) -> Self {
        Self::with_embedder(NgramEmbedder::default(), max_concepts)
    }
}

impl<E: NameEmbedder> IntelligenceEngine<E> {
    pub fn with_embedder(embedder: E, max_concepts: usize) -> Self {
        Self {
            embedder,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            max_concepts,
        }
    }

    pub fn with_distance_threshold(mut self, threshold: f32) -> Self {
        self.distance_threshold = threshold;
        self
    }

    /// Returns the selected learning set, best first.
    pub fn run(&self, records: Vec<ConceptKnowledge>) -> Vec<ConceptKnowledge> {
        if records.is_empty() {
            return Vec::new();
        }

        let embeddings: Vec<Vec<f32>> = records
            .iter()
            .map(|record| self.embedder.embed(&record.concept))
            .collect();
        let clusters = cluster_by_distance(&embeddings, self.distance_threshold);

        let graph = ConceptGraph::build(&records);
        let scores: Vec<f32> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                score(
                    graph.centrality(index),
                    record.knowledge.density(),
                    record.concept_type(),
                )
            })
            .collect();

        let merged: Vec<ScoredKnowledge> = clusters
            .iter()
            .filter_map(|members| merge_cluster(members, &records, &scores))
            .collect();

        let input_count = records.len();
        let cluster_count = merged.len();
        let selected = select_learning_concepts(merged, self.max_concepts);
        info!(
            "event=intelligence_run module=intelligence status=ok embedder={} input={} clusters={} edges={} selected={}",
            self.embedder.model_version(),
            input_count,
            cluster_count,
            graph.edge_count(),
            selected.len()
        );
        selected
    }
}

fn by_score_then_index(a: &ScoredKnowledge, b: &ScoredKnowledge) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}

/// Collapses one cluster into its top-scored member, backfilled by the rest.
fn merge_cluster(
    members: &[usize],
    records: &[ConceptKnowledge],
    scores: &[f32],
) -> Option<ScoredKnowledge> {
    let mut ranked: Vec<ScoredKnowledge> = members
        .iter()
        .map(|&index| ScoredKnowledge {
            knowledge: records[index].clone(),
            score: scores[index],
            index,
        })
        .collect();
    ranked.sort_by(by_score_then_index);

    let mut ranked = ranked.into_iter();
    let mut base = ranked.next()?;
    for donor in ranked {
        debug!(
            "event=concept_merge module=intelligence base=\"{}\" donor=\"{}\"",
            base.knowledge.concept, donor.knowledge.concept
        );
        for (name, value) in donor.knowledge.knowledge.fields() {
            let Some(value) = value.filter(|text| text.is_filled()) else {
                continue;
            };
            if let Some(slot) = base.knowledge.knowledge.field_mut(name) {
                if !slot.as_ref().is_some_and(Text::is_filled) {
                    *slot = Some(value.clone());
                }
            }
        }
    }
    Some(base)
}

/// Ranks by score (input index breaks ties) and keeps at most `max_concepts`,
/// admitting a single `Application`.
pub fn select_learning_concepts(
    mut candidates: Vec<ScoredKnowledge>,
    max_concepts: usize,
) -> Vec<ConceptKnowledge> {
    candidates.sort_by(by_score_then_index);

    let mut applications = 0;
    let mut selected = Vec::new();
    for candidate in candidates {
        if selected.len() >= max_concepts {
            break;
        }
        if candidate.knowledge.concept_type() == ConceptType::Application {
            if applications >= MAX_APPLICATIONS {
                continue;
            }
            applications += 1;
        }
        selected.push(candidate.knowledge);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::{select_learning_concepts, IntelligenceEngine, ScoredKnowledge};
    use crate::model::concept::ConceptType;
    use crate::model::knowledge::{ConceptKnowledge, Knowledge};
    use crate::text::Text;

    fn record(name: &str, kind: ConceptType, fields: &[(&str, &str)]) -> ConceptKnowledge {
        let mut knowledge = Knowledge::empty(kind);
        for (field, value) in fields {
            *knowledge.field_mut(field).unwrap() = Some(Text::from(*value));
        }
        ConceptKnowledge::try_new(name, knowledge).unwrap()
    }

    #[test]
    fn selection_admits_one_application() {
        let candidates = (0..4)
            .map(|index| ScoredKnowledge {
                knowledge: record(&format!("Use {index}"), ConceptType::Application, &[]),
                score: 1.0 - index as f32 * 0.1,
                index,
            })
            .chain(std::iter::once(ScoredKnowledge {
                knowledge: record("Stack", ConceptType::Definition, &[]),
                score: 0.1,
                index: 4,
            }))
            .collect();

        let selected = select_learning_concepts(candidates, 10);
        let names: Vec<&str> = selected.iter().map(|ck| ck.concept.as_str()).collect();
        assert_eq!(names, vec!["Use 0", "Stack"]);
    }

    #[test]
    fn stem_variants_merge_into_denser_record_with_backfill() {
        let records = vec![
            record(
                "Insertion",
                ConceptType::Operation,
                &[("action", "Adds a key")],
            ),
            record(
                "Insert",
                ConceptType::Operation,
                &[("action", "Places a key"), ("state_change", "Size grows")],
            ),
            record(
                "Insert Sort",
                ConceptType::Principle,
                &[("rule", "unknown")],
            ),
        ];

        let selected = IntelligenceEngine::new(10)
            .with_distance_threshold(0.01)
            .run(records);

        let merged = selected
            .iter()
            .find(|ck| ck.concept == "Insert")
            .expect("denser member becomes the base");
        assert_eq!(merged.knowledge.filled_count(), 2);
        assert!(selected.iter().all(|ck| ck.concept != "Insertion"));
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn backfill_fills_only_missing_base_fields() {
        let records = vec![
            record(
                "Push",
                ConceptType::Operation,
                &[("action", "Adds on top"), ("state_change", "Size grows")],
            ),
            record(
                "Pushing",
                ConceptType::Operation,
                &[("action", "Other text"), ("edge_cases", "Full stack")],
            ),
        ];

        let selected = IntelligenceEngine::new(10).run(records);
        assert_eq!(selected.len(), 1);
        let fields = selected[0].knowledge.fields();
        assert_eq!(fields[0].1, Some(&Text::from("Adds on top")));
        assert_eq!(fields[2].1, Some(&Text::from("Full stack")));
    }
}
