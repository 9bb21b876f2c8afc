use scrolla_core::intelligence::IntelligenceEngine;
use scrolla_core::service::concept_validator::validate_concepts;
use scrolla_core::{ConceptCandidate, ConceptKnowledge, ConceptType, Knowledge, Text};

fn record(name: &str, kind: ConceptType, fields: &[(&str, &str)]) -> ConceptKnowledge {
    let mut knowledge = Knowledge::empty(kind);
    for (field, value) in fields {
        *knowledge.field_mut(field).unwrap() = Some(Text::from(*value));
    }
    ConceptKnowledge::try_new(name, knowledge).unwrap()
}

#[test]
fn validation_filters_noise_and_collapses_case_variants() {
    let candidates = vec![
        ConceptCandidate::new("Push Operation", "Operation", 0.9),
        ConceptCandidate::new("push operation", "Operation", 0.95),
        ConceptCandidate::new("Stack", "Entity", 0.9),
        ConceptCandidate::new("Stack Frame", "Concept", 0.5),
        ConceptCandidate::new("Stack in computer science", "Definition", 0.9),
        ConceptCandidate::new("Very Long Stack Concept Name", "Definition", 0.9),
        ConceptCandidate::new("Stack Overflow", "Rumor", 0.9),
    ];

    let concepts = validate_concepts(&candidates, "Stack Push Operation");
    let names = concepts
        .iter()
        .map(|concept| (concept.name.as_str(), concept.kind))
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            ("Push Operation", ConceptType::Operation),
            ("Stack", ConceptType::Definition),
        ]
    );
}

#[test]
fn intelligence_merges_stem_variants_and_limits_applications() {
    let records = vec![
        record(
            "Stack",
            ConceptType::Definition,
            &[("what_it_is", "A pile where push adds on top.")],
        ),
        record(
            "Push",
            ConceptType::Operation,
            &[("action", "Adds one item."), ("state_change", "Top moves up.")],
        ),
        record(
            "Pushing",
            ConceptType::Operation,
            &[("edge_cases", "Full fixed-size stack.")],
        ),
        record(
            "Undo History",
            ConceptType::Application,
            &[("use_cases", "Editors keep a stack of edits.")],
        ),
        record(
            "Call Frames",
            ConceptType::Application,
            &[("use_cases", "Runtimes push frames per call.")],
        ),
    ];

    let selected = IntelligenceEngine::new(10).run(records);

    let names = selected
        .iter()
        .map(|record| record.concept.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"Stack"));
    assert!(names.contains(&"Push"));
    assert!(!names.contains(&"Pushing"));
    assert_eq!(
        selected
            .iter()
            .filter(|record| record.concept_type() == ConceptType::Application)
            .count(),
        1
    );

    let push = selected
        .iter()
        .find(|record| record.concept == "Push")
        .unwrap();
    assert_eq!(push.knowledge.filled_count(), 3);
}
