//! Per-concept atom plans.

use crate::model::atom::{AtomPlanItem, AtomType};
use crate::model::concept::ConceptType;

/// Type-specific atoms placed between the mental model and the quiz.
fn middle_section(concept_type: ConceptType) -> [Option<AtomType>; 3] {
    match concept_type {
        ConceptType::Definition => [
            Some(AtomType::KeyPoints),
            Some(AtomType::Example),
            Some(AtomType::WhyItMatters),
        ],
        ConceptType::Operation => [
            Some(AtomType::Steps),
            Some(AtomType::EdgeCases),
            Some(AtomType::Pitfall),
        ],
        ConceptType::Complexity => [
            Some(AtomType::Intuition),
            Some(AtomType::Comparison),
            Some(AtomType::Pitfall),
        ],
        ConceptType::Pitfall => [
            Some(AtomType::WhyItHappens),
            Some(AtomType::Impact),
            Some(AtomType::Prevention),
        ],
        ConceptType::Application => [
            Some(AtomType::RealWorldUse),
            Some(AtomType::WhySuitable),
            None,
        ],
        ConceptType::Principle => [Some(AtomType::Rule), Some(AtomType::Consequence), None],
    }
}

/// Ordered atom requests for one concept: explanation, mental model, the
/// type-specific middle, then a quick check.
pub fn plan_atoms(concept: &str, concept_type: ConceptType) -> Vec<AtomPlanItem> {
    [Some(AtomType::Explanation), Some(AtomType::MentalModel)]
        .into_iter()
        .chain(middle_section(concept_type))
        .chain([Some(AtomType::QuickCheck)])
        .flatten()
        .map(|atom_type| AtomPlanItem {
            concept: concept.to_string(),
            concept_type,
            atom_type,
        })
        .collect()
}
