use scrolla_core::config::{GenerationMode, PipelineSettings};
use scrolla_core::db::open_db_in_memory;
use scrolla_core::service::pipeline::EmptyStage;
use scrolla_core::{
    AtomDraft, AtomGenerator, AtomPlanItem, AtomType, Concept, ConceptCandidate,
    ConceptExtractor, ConceptKnowledge, ConceptType, FeedRepository, GenerateError, Generators,
    Knowledge, KnowledgeGenerator, KnowledgeRepository, Pipeline, PipelineOutcome,
    SourceProvider, SqliteFeedRepository, SqliteKnowledgeRepository, StaticSource, Text,
};
use std::cell::{Cell, RefCell};

struct ScriptedExtractor {
    candidates: Vec<ConceptCandidate>,
}

impl ConceptExtractor for ScriptedExtractor {
    fn extract_concepts(
        &self,
        _topic: &str,
        text: &str,
    ) -> Result<Vec<ConceptCandidate>, GenerateError> {
        assert!(text.contains("last in, first out"));
        Ok(self.candidates.clone())
    }
}

#[derive(Default)]
struct ScriptedKnowledge {
    failing: Vec<&'static str>,
    calls: RefCell<Vec<String>>,
}

impl KnowledgeGenerator for ScriptedKnowledge {
    fn generate_knowledge(
        &self,
        _topic: &str,
        concept: &Concept,
        _context: &str,
    ) -> Result<ConceptKnowledge, GenerateError> {
        self.calls.borrow_mut().push(concept.name.clone());
        if self.failing.contains(&concept.name.as_str()) {
            return Err(GenerateError::Timeout { attempts: 3 });
        }
        Ok(filled_knowledge(&concept.name, concept.kind))
    }
}

#[derive(Default)]
struct ScriptedAtoms {
    failing: Vec<&'static str>,
    planned_calls: Cell<usize>,
}

impl AtomGenerator for ScriptedAtoms {
    fn generate_atom_drafts(
        &self,
        _topic: &str,
        knowledge: &ConceptKnowledge,
    ) -> Result<Vec<AtomDraft>, GenerateError> {
        if self.failing.contains(&knowledge.concept.as_str()) {
            return Err(GenerateError::Malformed("atom bundle is not a list".to_string()));
        }
        Ok(vec![
            AtomDraft {
                atom_type: AtomType::QuickCheck,
                content: Text::from("Is the newest item removed first? Answer: yes"),
            },
            AtomDraft {
                atom_type: AtomType::Explanation,
                content: Text::from("It keeps the newest item on top."),
            },
            AtomDraft {
                atom_type: AtomType::KeyPoints,
                content: Text::Lines(vec!["Top access only".into(), "Constant time push".into()]),
            },
        ])
    }

    fn generate_atom_draft(
        &self,
        _topic: &str,
        item: &AtomPlanItem,
        _knowledge: &ConceptKnowledge,
    ) -> Result<Text, GenerateError> {
        self.planned_calls.set(self.planned_calls.get() + 1);
        if item.atom_type == AtomType::QuickCheck {
            Ok(Text::from("Does this change the top item?"))
        } else {
            Ok(Text::from("A short plain sentence here."))
        }
    }
}

fn filled_knowledge(name: &str, kind: ConceptType) -> ConceptKnowledge {
    let mut knowledge = Knowledge::empty(kind);
    let fields = knowledge
        .fields()
        .into_iter()
        .map(|(field, _)| field)
        .collect::<Vec<_>>();
    for field in fields {
        *knowledge.field_mut(field).unwrap() = Some(Text::from(format!("{name} {field}")));
    }
    ConceptKnowledge::try_new(name, knowledge).unwrap()
}

fn stack_candidates() -> Vec<ConceptCandidate> {
    vec![
        ConceptCandidate::new("Stack", "Concept", 0.95),
        ConceptCandidate::new("Stack Push", "Operation", 0.9),
        ConceptCandidate::new("Stack Overflow", "Pitfall", 0.85),
        ConceptCandidate::new("Queue", "Definition", 0.99),
    ]
}

fn sources() -> Vec<Box<dyn SourceProvider>> {
    vec![Box::new(StaticSource::new(
        "notes",
        "A stack is a last in, first out collection.",
    ))]
}

#[test]
fn failing_concept_is_skipped_and_partial_feed_is_persisted() {
    let conn = open_db_in_memory().unwrap();
    let extractor = ScriptedExtractor {
        candidates: stack_candidates(),
    };
    let knowledge = ScriptedKnowledge {
        failing: vec!["Stack Overflow"],
        ..ScriptedKnowledge::default()
    };
    let atoms = ScriptedAtoms::default();
    let pipeline = Pipeline::new(
        Generators {
            extractor: &extractor,
            knowledge: &knowledge,
            atoms: &atoms,
        },
        sources(),
        SqliteKnowledgeRepository::try_new(&conn).unwrap(),
        SqliteFeedRepository::try_new(&conn).unwrap(),
        PipelineSettings::default(),
    );

    let outcome = pipeline.run("Stack").unwrap();
    let PipelineOutcome::Completed {
        feed,
        skipped_concepts,
        ..
    } = outcome
    else {
        panic!("expected a completed run");
    };

    assert_eq!(skipped_concepts, vec!["Stack Overflow".to_string()]);
    assert_eq!(
        *knowledge.calls.borrow(),
        vec!["Stack", "Stack Push", "Stack Overflow"]
    );
    assert_eq!(feed.len(), 6);
    feed.validate_order().unwrap();

    let first = &feed.atoms[0];
    assert_eq!(first.concept, "Stack");
    assert_eq!(first.atom_type, AtomType::Explanation);
    let quiz = feed
        .atoms
        .iter()
        .find(|atom| atom.atom_type == AtomType::QuickCheck)
        .unwrap();
    assert_eq!(quiz.content, "Is the newest item removed first?");

    let feed_repo = SqliteFeedRepository::try_new(&conn).unwrap();
    assert_eq!(feed_repo.load_feed("stack").unwrap(), Some(feed));
    assert_eq!(feed_repo.load_concepts("Stack").unwrap().len(), 3);
    let archived = feed_repo.load_raw_sources("Stack").unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].name, "notes");
    assert_eq!(archived[0].text, "A stack is a last in, first out collection.");

    let stored = SqliteKnowledgeRepository::try_new(&conn)
        .unwrap()
        .list("Stack")
        .unwrap();
    let names = stored
        .iter()
        .map(|record| record.concept.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Stack", "Stack Push"]);
}

#[test]
fn cached_knowledge_never_reaches_the_generator() {
    let conn = open_db_in_memory().unwrap();
    let knowledge_repo = SqliteKnowledgeRepository::try_new(&conn).unwrap();
    knowledge_repo
        .save("Stack", &filled_knowledge("Stack", ConceptType::Definition))
        .unwrap();
    knowledge_repo
        .save("Stack", &filled_knowledge("Stack Pushing", ConceptType::Operation))
        .unwrap();

    let extractor = ScriptedExtractor {
        candidates: stack_candidates()[..2].to_vec(),
    };
    let knowledge = ScriptedKnowledge::default();
    let atoms = ScriptedAtoms::default();
    let pipeline = Pipeline::new(
        Generators {
            extractor: &extractor,
            knowledge: &knowledge,
            atoms: &atoms,
        },
        sources(),
        knowledge_repo,
        SqliteFeedRepository::try_new(&conn).unwrap(),
        PipelineSettings::default(),
    );

    let outcome = pipeline.run("Stack").unwrap();
    assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
    assert!(knowledge.calls.borrow().is_empty());
}

#[test]
fn empty_stages_are_reported_without_persisting_a_feed() {
    let conn = open_db_in_memory().unwrap();
    let knowledge = ScriptedKnowledge::default();
    let atoms = ScriptedAtoms::default();

    let off_topic = ScriptedExtractor {
        candidates: vec![ConceptCandidate::new("Queue", "Definition", 0.99)],
    };
    let pipeline = Pipeline::new(
        Generators {
            extractor: &off_topic,
            knowledge: &knowledge,
            atoms: &atoms,
        },
        sources(),
        SqliteKnowledgeRepository::try_new(&conn).unwrap(),
        SqliteFeedRepository::try_new(&conn).unwrap(),
        PipelineSettings::default(),
    );
    assert_eq!(
        pipeline.run("Stack").unwrap(),
        PipelineOutcome::NothingProduced {
            stage: EmptyStage::NoConcepts
        }
    );

    let failing_atoms = ScriptedAtoms {
        failing: vec!["Stack"],
        ..ScriptedAtoms::default()
    };
    let extractor = ScriptedExtractor {
        candidates: stack_candidates()[..1].to_vec(),
    };
    let pipeline = Pipeline::new(
        Generators {
            extractor: &extractor,
            knowledge: &knowledge,
            atoms: &failing_atoms,
        },
        sources(),
        SqliteKnowledgeRepository::try_new(&conn).unwrap(),
        SqliteFeedRepository::try_new(&conn).unwrap(),
        PipelineSettings::default(),
    );
    assert_eq!(
        pipeline.run("Stack").unwrap(),
        PipelineOutcome::NothingProduced {
            stage: EmptyStage::NoAtoms
        }
    );

    let feed_repo = SqliteFeedRepository::try_new(&conn).unwrap();
    assert!(feed_repo.load_feed("Stack").unwrap().is_none());
}

#[test]
fn planned_mode_requests_one_draft_per_plan_item() {
    let conn = open_db_in_memory().unwrap();
    let extractor = ScriptedExtractor {
        candidates: stack_candidates()[..2].to_vec(),
    };
    let knowledge = ScriptedKnowledge::default();
    let atoms = ScriptedAtoms::default();
    let settings = PipelineSettings {
        generation_mode: GenerationMode::Planned,
        ..PipelineSettings::default()
    };
    let pipeline = Pipeline::new(
        Generators {
            extractor: &extractor,
            knowledge: &knowledge,
            atoms: &atoms,
        },
        sources(),
        SqliteKnowledgeRepository::try_new(&conn).unwrap(),
        SqliteFeedRepository::try_new(&conn).unwrap(),
        settings,
    );

    let PipelineOutcome::Completed { feed, .. } = pipeline.run("Stack").unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(atoms.planned_calls.get(), 12);
    assert_eq!(feed.len(), 12);
    assert!(feed
        .atoms
        .iter()
        .all(|atom| atom.concept == "Stack" || atom.concept == "Stack Push"));
}

#[test]
fn intelligence_merges_near_duplicates_and_keeps_one_application() {
    let conn = open_db_in_memory().unwrap();
    let extractor = ScriptedExtractor {
        candidates: vec![
            ConceptCandidate::new("Linked List", "Concept", 0.95),
            ConceptCandidate::new("Singly Linked List", "Definition", 0.9),
            ConceptCandidate::new("List Undo Buffer", "Application", 0.85),
            ConceptCandidate::new("Image Viewer List", "Application", 0.85),
        ],
    };
    let knowledge = ScriptedKnowledge::default();
    let atoms = ScriptedAtoms::default();
    let settings = PipelineSettings {
        use_intelligence: true,
        ..PipelineSettings::default()
    };
    let pipeline = Pipeline::new(
        Generators {
            extractor: &extractor,
            knowledge: &knowledge,
            atoms: &atoms,
        },
        sources(),
        SqliteKnowledgeRepository::try_new(&conn).unwrap(),
        SqliteFeedRepository::try_new(&conn).unwrap(),
        settings,
    );

    let PipelineOutcome::Completed { feed, .. } = pipeline.run("Linked List").unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(knowledge.calls.borrow().len(), 4);

    let mut concepts = feed
        .atoms
        .iter()
        .map(|atom| atom.concept.as_str())
        .collect::<Vec<_>>();
    concepts.dedup();
    assert_eq!(concepts.len(), 2, "{concepts:?}");

    let list_variants = concepts
        .iter()
        .filter(|name| name.ends_with("Linked List"))
        .count();
    assert_eq!(list_variants, 1);
    let applications = concepts
        .iter()
        .filter(|name| **name == "List Undo Buffer" || **name == "Image Viewer List")
        .count();
    assert_eq!(applications, 1);
    assert_eq!(feed.len(), 6);
    feed.validate_order().unwrap();
}
