//! Concept importance scoring.

use crate::model::concept::ConceptType;

const CENTRALITY_WEIGHT: f32 = 0.35;
const DENSITY_WEIGHT: f32 = 0.35;
const TYPE_PRIOR_WEIGHT: f32 = 0.15;
const STAGE_WEIGHT: f32 = 0.15;
const CENTRALITY_SATURATION: f32 = 5.0;

/// How central a concept type usually is to understanding a topic.
pub fn type_prior(kind: ConceptType) -> f32 {
    match kind {
        ConceptType::Definition => 1.0,
        ConceptType::Principle => 0.9,
        ConceptType::Operation => 0.85,
        ConceptType::Complexity => 0.75,
        ConceptType::Pitfall => 0.7,
        ConceptType::Application => 0.6,
    }
}

/// How early a concept type belongs in a learning sequence.
pub fn stage_weight(kind: ConceptType) -> f32 {
    match kind {
        ConceptType::Definition => 1.0,
        ConceptType::Principle => 0.95,
        ConceptType::Operation => 0.9,
        ConceptType::Complexity => 0.75,
        ConceptType::Pitfall => 0.7,
        ConceptType::Application => 0.4,
    }
}

/// Weighted blend of saturated centrality, density, type prior and stage.
pub fn score(centrality: usize, density: f32, kind: ConceptType) -> f32 {
    let centrality = (centrality as f32 / CENTRALITY_SATURATION).min(1.0);
    CENTRALITY_WEIGHT * centrality
        + DENSITY_WEIGHT * density
        + TYPE_PRIOR_WEIGHT * type_prior(kind)
        + STAGE_WEIGHT * stage_weight(kind)
}

#[cfg(test)]
mod tests {
    use super::score;
    use crate::model::concept::ConceptType;

    #[test]
    fn score_is_monotonic_in_density() {
        let sparse = score(1, 0.2, ConceptType::Operation);
        let dense = score(1, 0.9, ConceptType::Operation);
        assert!(dense > sparse);
    }

    #[test]
    fn centrality_saturates_at_five() {
        let at_cap = score(5, 0.5, ConceptType::Principle);
        let beyond = score(12, 0.5, ConceptType::Principle);
        assert!((at_cap - beyond).abs() < 1e-6);
    }

    #[test]
    fn definition_outranks_application_at_equal_evidence() {
        assert!(
            score(2, 0.5, ConceptType::Definition) > score(2, 0.5, ConceptType::Application)
        );
    }
}
