//! Prompt construction for extraction, knowledge and atom generation.

use crate::model::atom::{AtomPlanItem, AtomType};
use crate::model::concept::{Concept, ConceptType};
use crate::model::knowledge::{ConceptKnowledge, Knowledge};
use crate::text::NormalizeMode;

/// Window of source text shown to the knowledge generator.
pub const MAX_FOCUS_CHARS: usize = 1200;
/// How far before the first mention the window starts.
const FOCUS_LEAD_CHARS: usize = 400;

/// Returns the part of `context` around the first case-insensitive mention
/// of `concept`, or its head when there is no mention.
pub fn focus_context<'a>(concept: &str, context: &'a str) -> &'a str {
    if context.is_empty() {
        return "";
    }

    let haystack = context.to_ascii_lowercase();
    let needle = concept.trim().to_ascii_lowercase();
    let (start, end) = match haystack.find(&needle).filter(|_| !needle.is_empty()) {
        Some(index) => (
            index.saturating_sub(FOCUS_LEAD_CHARS),
            index.saturating_add(MAX_FOCUS_CHARS),
        ),
        None => (0, MAX_FOCUS_CHARS),
    };
    let start = floor_char_boundary(context, start);
    let end = floor_char_boundary(context, end.min(context.len()));
    &context[start..end]
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

pub fn extraction_prompt(topic: &str, chunk: &str) -> String {
    let types = ConceptType::ALL
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You extract the concepts a learner needs to understand \"{topic}\".\n\
         Reply with JSON only, shaped as:\n\
         {{\"concepts\": [{{\"name\": \"...\", \"type\": \"...\", \"confidence\": 0.0}}]}}\n\
         Rules:\n\
         - type is one of: {types}\n\
         - confidence is between 0 and 1\n\
         - names are short and canonical, 1 to 4 words\n\
         - skip background and tangential ideas\n\
         - no prose outside the JSON\n\
         TEXT:\n{chunk}"
    )
}

pub fn knowledge_prompt(topic: &str, concept: &Concept, context: &str) -> String {
    let fields = Knowledge::empty(concept.kind)
        .fields()
        .into_iter()
        .map(|(name, _)| format!("    \"{name}\": \"...\""))
        .collect::<Vec<_>>()
        .join(",\n");
    let focused = focus_context(&concept.name, context);
    format!(
        "You fill in structured learning knowledge.\n\
         Topic: {topic}\n\
         Concept: {name}\n\
         Concept type: {kind}\n\
         Context:\n{focused}\n\n\
         Reply with JSON only, shaped as:\n\
         {{\n  \"concept\": \"{name}\",\n  \"type\": \"{kind}\",\n  \"knowledge\": {{\n{fields}\n  }}\n}}\n\
         Rules:\n\
         - use exactly these knowledge fields\n\
         - write \"unknown\" when the context does not support a field\n\
         - plain beginner language, no citations",
        name = concept.name,
        kind = concept.kind,
    )
}

/// Knowledge rendered as `- field name: value` lines, filled fields only.
pub fn format_knowledge(knowledge: &ConceptKnowledge) -> String {
    knowledge
        .knowledge
        .fields()
        .into_iter()
        .filter_map(|(name, value)| {
            value.filter(|text| text.is_filled()).map(|text| {
                format!(
                    "- {}: {}",
                    name.replace('_', " "),
                    text.normalize(NormalizeMode::Curation)
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn atom_bundle_prompt(topic: &str, knowledge: &ConceptKnowledge) -> String {
    format!(
        "You write learning atoms for a scrolling study feed.\n\
         Topic: {topic}\n\
         Concept: {concept}\n\
         Concept type: {kind}\n\
         Knowledge:\n{facts}\n\n\
         Write 6 to 10 atoms. Allowed atom types: explanation, mental_model, example, \
         key_points, pitfall, why_it_matters, quick_check.\n\
         Keep each atom short and beginner friendly, with no headings, emojis or repetition.\n\
         Reply with JSON only, shaped as:\n\
         [{{\"atom_type\": \"...\", \"content\": \"...\"}}]",
        concept = knowledge.concept,
        kind = knowledge.concept_type(),
        facts = format_knowledge(knowledge),
    )
}

/// Task lines for a single planned atom.
fn atom_task(atom_type: &AtomType) -> &'static str {
    match atom_type {
        AtomType::Explanation => "Explain the idea simply, without formal definitions or examples. At most 2 sentences and 30 words.",
        AtomType::MentalModel => "Give one fresh analogy specific to this concept. One sentence, at most 25 words.",
        AtomType::Example => "Give one concrete real-world or software example. One sentence, at most 25 words.",
        AtomType::KeyPoints => "List 3 or 4 bullet points of at most 8 words each.",
        AtomType::WhyItMatters => "Say why this concept is useful. One or two short sentences, at most 30 words.",
        AtomType::Steps => "List at most 5 steps of at most 6 words each.",
        AtomType::EdgeCases => "List up to 3 edge cases of at most 10 words each.",
        AtomType::Intuition => "Explain the intuition without formulas. One or two short sentences, at most 30 words.",
        AtomType::Comparison => "Compare with one related alternative and name one clear difference. At most 2 sentences and 30 words.",
        AtomType::Pitfall => "Describe one common mistake without the fix. One sentence, at most 25 words.",
        AtomType::WhyItHappens => "Explain why this mistake occurs. One short sentence, at most 20 words.",
        AtomType::Impact => "Explain the performance or correctness impact. One short sentence, at most 25 words.",
        AtomType::Prevention => "State one way to avoid the issue. One sentence, at most 20 words.",
        AtomType::RealWorldUse => "Describe one real-world use case. One sentence, at most 25 words.",
        AtomType::WhySuitable => "Explain why this concept fits the use case. One sentence, at most 25 words.",
        AtomType::Rule => "State the core rule. One sentence, at most 20 words.",
        AtomType::Consequence => "Explain what happens when the rule is followed or broken. One sentence, at most 25 words.",
        AtomType::QuickCheck => "Ask one yes/no or simple multiple-choice question without the answer. One sentence, at most 20 words.",
        AtomType::Other(_) => "Write one short, plain sentence about the concept.",
    }
}

pub fn atom_prompt(item: &AtomPlanItem, knowledge: &ConceptKnowledge) -> String {
    format!(
        "You write one learning atom.\n\
         Concept: {concept}\n\
         Concept type: {kind}\n\
         Knowledge:\n{facts}\n\n\
         Task: {task}\n\
         Reply with the atom text only.",
        concept = item.concept,
        kind = item.concept_type,
        facts = format_knowledge(knowledge),
        task = atom_task(&item.atom_type),
    )
}

#[cfg(test)]
mod tests {
    use super::{focus_context, format_knowledge, knowledge_prompt, MAX_FOCUS_CHARS};
    use crate::model::concept::{Concept, ConceptType};
    use crate::model::knowledge::{ConceptKnowledge, Knowledge};
    use crate::text::Text;

    #[test]
    fn focus_window_starts_before_first_mention() {
        let context = format!("{}Push adds an item.{}", "a".repeat(1000), "b".repeat(2000));
        let focused = focus_context("push", &context);
        assert_eq!(focused.len(), 400 + MAX_FOCUS_CHARS);
        assert!(focused[400..].starts_with("Push adds"));
    }

    #[test]
    fn focus_falls_back_to_head_and_respects_char_boundaries() {
        let context = "é".repeat(1000);
        let focused = focus_context("missing", &context);
        assert!(focused.len() <= MAX_FOCUS_CHARS);
        assert!(focused.chars().all(|ch| ch == 'é'));
        assert_eq!(focus_context("x", ""), "");
    }

    #[test]
    fn knowledge_prompt_lists_contract_fields() {
        let prompt = knowledge_prompt("Stack", &Concept::new("Push", ConceptType::Operation), "");
        for field in ["\"action\"", "\"state_change\"", "\"edge_cases\""] {
            assert!(prompt.contains(field), "{field}");
        }
        assert!(!prompt.contains("what_it_is"));
    }

    #[test]
    fn formatted_knowledge_skips_unfilled_fields() {
        let mut knowledge = Knowledge::empty(ConceptType::Pitfall);
        *knowledge.field_mut("failure_condition").unwrap() = Some(Text::from("Popping empty"));
        *knowledge.field_mut("impact").unwrap() = Some(Text::from("unknown"));
        let record = ConceptKnowledge::try_new("Underflow", knowledge).unwrap();
        assert_eq!(format_knowledge(&record), "- failure condition: Popping empty");
    }
}
