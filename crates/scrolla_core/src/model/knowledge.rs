//! Structured per-concept knowledge with a fixed field contract per type.
//!
//! # Responsibility
//! - Model each concept type's knowledge fields as an explicit struct.
//! - Build records leniently from generator replies and strictly from storage.
//! - Compute fill density used by scoring and acceptance checks.
//!
//! # Invariants
//! - A `ConceptKnowledge` always has a non-blank concept name.
//! - Persisted records with fields outside the type contract are rejected.
//! - A field counts as filled only when non-empty and not `unknown`.

use crate::model::concept::{Concept, ConceptType};
use crate::text::{stem, NormalizeMode, Text};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identity or shape violation on a knowledge record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeError {
    MissingConcept,
    UnknownType(String),
    /// `knowledge` payload is not a JSON object.
    NotAnObject,
    /// Payload does not match the type's field contract.
    Contract { kind: ConceptType, message: String },
}

impl Display for KnowledgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingConcept => write!(f, "concept knowledge is missing its concept name"),
            Self::UnknownType(label) => write!(f, "unknown concept type `{label}`"),
            Self::NotAnObject => write!(f, "concept knowledge payload is not an object"),
            Self::Contract { kind, message } => {
                write!(f, "knowledge does not match {kind} contract: {message}")
            }
        }
    }
}

impl Error for KnowledgeError {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionKnowledge {
    pub what_it_is: Option<Text>,
    pub core_structure: Option<Text>,
    pub access_restriction: Option<Text>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipleKnowledge {
    pub rule: Option<Text>,
    pub conditions: Option<Text>,
    pub violation_consequence: Option<Text>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationKnowledge {
    pub action: Option<Text>,
    pub state_change: Option<Text>,
    pub edge_cases: Option<Text>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplexityKnowledge {
    pub time_complexity: Option<Text>,
    pub space_complexity: Option<Text>,
    pub dependency_factors: Option<Text>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationKnowledge {
    pub use_cases: Option<Text>,
    pub why_suitable: Option<Text>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PitfallKnowledge {
    pub failure_condition: Option<Text>,
    pub impact: Option<Text>,
    pub prevention: Option<Text>,
}

/// Knowledge payload tagged by concept type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Knowledge {
    Definition(DefinitionKnowledge),
    Principle(PrincipleKnowledge),
    Operation(OperationKnowledge),
    Complexity(ComplexityKnowledge),
    Application(ApplicationKnowledge),
    Pitfall(PitfallKnowledge),
}

impl Knowledge {
    /// Returns a record of `kind` with every contract field unset.
    pub fn empty(kind: ConceptType) -> Self {
        match kind {
            ConceptType::Definition => Self::Definition(DefinitionKnowledge::default()),
            ConceptType::Principle => Self::Principle(PrincipleKnowledge::default()),
            ConceptType::Operation => Self::Operation(OperationKnowledge::default()),
            ConceptType::Complexity => Self::Complexity(ComplexityKnowledge::default()),
            ConceptType::Application => Self::Application(ApplicationKnowledge::default()),
            ConceptType::Pitfall => Self::Pitfall(PitfallKnowledge::default()),
        }
    }

    pub fn concept_type(&self) -> ConceptType {
        match self {
            Self::Definition(_) => ConceptType::Definition,
            Self::Principle(_) => ConceptType::Principle,
            Self::Operation(_) => ConceptType::Operation,
            Self::Complexity(_) => ConceptType::Complexity,
            Self::Application(_) => ConceptType::Application,
            Self::Pitfall(_) => ConceptType::Pitfall,
        }
    }

    /// Contract fields in declaration order.
    pub fn fields(&self) -> Vec<(&'static str, Option<&Text>)> {
        match self {
            Self::Definition(k) => vec![
                ("what_it_is", k.what_it_is.as_ref()),
                ("core_structure", k.core_structure.as_ref()),
                ("access_restriction", k.access_restriction.as_ref()),
            ],
            Self::Principle(k) => vec![
                ("rule", k.rule.as_ref()),
                ("conditions", k.conditions.as_ref()),
                ("violation_consequence", k.violation_consequence.as_ref()),
            ],
            Self::Operation(k) => vec![
                ("action", k.action.as_ref()),
                ("state_change", k.state_change.as_ref()),
                ("edge_cases", k.edge_cases.as_ref()),
            ],
            Self::Complexity(k) => vec![
                ("time_complexity", k.time_complexity.as_ref()),
                ("space_complexity", k.space_complexity.as_ref()),
                ("dependency_factors", k.dependency_factors.as_ref()),
            ],
            Self::Application(k) => vec![
                ("use_cases", k.use_cases.as_ref()),
                ("why_suitable", k.why_suitable.as_ref()),
            ],
            Self::Pitfall(k) => vec![
                ("failure_condition", k.failure_condition.as_ref()),
                ("impact", k.impact.as_ref()),
                ("prevention", k.prevention.as_ref()),
            ],
        }
    }

    /// Mutable slot for a contract field, `None` when `name` is not part of
    /// this type's contract.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Option<Text>> {
        let slot = match (self, name) {
            (Self::Definition(k), "what_it_is") => &mut k.what_it_is,
            (Self::Definition(k), "core_structure") => &mut k.core_structure,
            (Self::Definition(k), "access_restriction") => &mut k.access_restriction,
            (Self::Principle(k), "rule") => &mut k.rule,
            (Self::Principle(k), "conditions") => &mut k.conditions,
            (Self::Principle(k), "violation_consequence") => &mut k.violation_consequence,
            (Self::Operation(k), "action") => &mut k.action,
            (Self::Operation(k), "state_change") => &mut k.state_change,
            (Self::Operation(k), "edge_cases") => &mut k.edge_cases,
            (Self::Complexity(k), "time_complexity") => &mut k.time_complexity,
            (Self::Complexity(k), "space_complexity") => &mut k.space_complexity,
            (Self::Complexity(k), "dependency_factors") => &mut k.dependency_factors,
            (Self::Application(k), "use_cases") => &mut k.use_cases,
            (Self::Application(k), "why_suitable") => &mut k.why_suitable,
            (Self::Pitfall(k), "failure_condition") => &mut k.failure_condition,
            (Self::Pitfall(k), "impact") => &mut k.impact,
            (Self::Pitfall(k), "prevention") => &mut k.prevention,
            _ => return None,
        };
        Some(slot)
    }

    pub fn filled_count(&self) -> usize {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.is_some_and(Text::is_filled))
            .count()
    }

    /// Fraction of contract fields that are filled.
    pub fn density(&self) -> f32 {
        let total = self.fields().len().max(1);
        self.filled_count() as f32 / total as f32
    }

    /// At least half of the contract fields (and at least one) are filled.
    pub fn is_dense(&self) -> bool {
        self.filled_count() >= (self.fields().len() / 2).max(1)
    }

    /// Concatenated text of all filled fields, newline separated.
    pub fn text_blob(&self) -> String {
        self.fields()
            .into_iter()
            .filter_map(|(_, value)| value.filter(|text| text.is_filled()))
            .map(|text| text.normalize(NormalizeMode::Curation))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Builds a record from a generator reply object.
    ///
    /// Missing contract fields stay unset; fields outside the contract and
    /// non-text values are dropped.
    pub fn from_reply(kind: ConceptType, object: &Map<String, Value>) -> Self {
        let mut knowledge = Self::empty(kind);
        for (name, value) in object {
            match knowledge.field_mut(name) {
                Some(slot) => *slot = Text::from_value(value),
                None => debug!(
                    "event=knowledge_field_dropped module=model kind={} field={}",
                    kind, name
                ),
            }
        }
        knowledge
    }

    /// Decodes a persisted record, rejecting fields outside the contract.
    pub fn from_json_map(
        kind: ConceptType,
        object: Map<String, Value>,
    ) -> Result<Self, KnowledgeError> {
        let value = Value::Object(object);
        let knowledge = match kind {
            ConceptType::Definition => Self::Definition(decode_contract(kind, value)?),
            ConceptType::Principle => Self::Principle(decode_contract(kind, value)?),
            ConceptType::Operation => Self::Operation(decode_contract(kind, value)?),
            ConceptType::Complexity => Self::Complexity(decode_contract(kind, value)?),
            ConceptType::Application => Self::Application(decode_contract(kind, value)?),
            ConceptType::Pitfall => Self::Pitfall(decode_contract(kind, value)?),
        };
        Ok(knowledge)
    }

    /// Encodes contract fields as a JSON object; unset fields become `null`.
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.fields()
            .into_iter()
            .map(|(name, value)| {
                let json = match value {
                    Some(Text::Plain(text)) => Value::String(text.clone()),
                    Some(Text::Lines(lines)) => {
                        Value::Array(lines.iter().cloned().map(Value::String).collect())
                    }
                    None => Value::Null,
                };
                (name.to_string(), json)
            })
            .collect()
    }
}

fn decode_contract<T: DeserializeOwned>(
    kind: ConceptType,
    value: Value,
) -> Result<T, KnowledgeError> {
    serde_json::from_value(value).map_err(|err| KnowledgeError::Contract {
        kind,
        message: err.to_string(),
    })
}

/// Structured knowledge for one concept within a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConceptKnowledge", into = "RawConceptKnowledge")]
pub struct ConceptKnowledge {
    pub concept: String,
    pub knowledge: Knowledge,
}

impl ConceptKnowledge {
    /// Creates a record, failing fast on a blank concept name.
    pub fn try_new(
        concept: impl Into<String>,
        knowledge: Knowledge,
    ) -> Result<Self, KnowledgeError> {
        let concept = concept.into();
        let trimmed = concept.trim();
        if trimmed.is_empty() {
            return Err(KnowledgeError::MissingConcept);
        }
        Ok(Self {
            concept: trimmed.to_string(),
            knowledge,
        })
    }

    /// Builds a record for `requested` from a generator reply.
    ///
    /// Identity always comes from the requested concept; the reply supplies
    /// fields either under a `knowledge` key or at the top level.
    pub fn from_reply(reply: &Value, requested: &Concept) -> Result<Self, KnowledgeError> {
        let object = reply.as_object().ok_or(KnowledgeError::NotAnObject)?;
        let fields = match object.get("knowledge") {
            Some(Value::Object(inner)) => inner,
            Some(_) => return Err(KnowledgeError::NotAnObject),
            None => object,
        };
        Self::try_new(
            requested.name.clone(),
            Knowledge::from_reply(requested.kind, fields),
        )
    }

    pub fn concept_type(&self) -> ConceptType {
        self.knowledge.concept_type()
    }

    /// Stemmed identity key of the concept name.
    pub fn identity_key(&self) -> String {
        stem(&self.concept)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConceptKnowledge {
    #[serde(default)]
    concept: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    knowledge: Map<String, Value>,
}

impl TryFrom<RawConceptKnowledge> for ConceptKnowledge {
    type Error = KnowledgeError;

    fn try_from(raw: RawConceptKnowledge) -> Result<Self, Self::Error> {
        let kind = ConceptType::parse(&raw.kind).ok_or(KnowledgeError::UnknownType(raw.kind))?;
        let knowledge = Knowledge::from_json_map(kind, raw.knowledge)?;
        Self::try_new(raw.concept, knowledge)
    }
}

impl From<ConceptKnowledge> for RawConceptKnowledge {
    fn from(value: ConceptKnowledge) -> Self {
        Self {
            kind: value.concept_type().as_str().to_string(),
            knowledge: value.knowledge.to_json_map(),
            concept: value.concept,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConceptKnowledge, Knowledge, KnowledgeError};
    use crate::model::concept::{Concept, ConceptType};
    use crate::text::Text;
    use serde_json::json;

    #[test]
    fn reply_fields_outside_contract_are_dropped() {
        let reply = json!({
            "knowledge": {
                "action": "Adds an item on top",
                "state_change": ["size grows by one"],
                "summary": "not part of the contract"
            }
        });
        let ck = ConceptKnowledge::from_reply(&reply, &Concept::new("Push", ConceptType::Operation))
            .unwrap();
        assert_eq!(ck.concept_type(), ConceptType::Operation);
        assert_eq!(ck.knowledge.filled_count(), 2);
        assert_eq!(ck.knowledge.fields().len(), 3);
    }

    #[test]
    fn density_ignores_unknown_sentinel() {
        let mut knowledge = Knowledge::empty(ConceptType::Definition);
        *knowledge.field_mut("what_it_is").unwrap() = Some(Text::from("A LIFO collection"));
        *knowledge.field_mut("core_structure").unwrap() = Some(Text::from("unknown"));
        assert_eq!(knowledge.filled_count(), 1);
        assert!((knowledge.density() - 1.0 / 3.0).abs() < 1e-6);
        assert!(knowledge.is_dense());
        assert!(knowledge.field_mut("impact").is_none());
    }

    #[test]
    fn persisted_shape_roundtrips_and_rejects_foreign_fields() {
        let json = json!({
            "concept": "Stack Overflow",
            "type": "Pitfall",
            "knowledge": {"failure_condition": "too many pushes", "impact": null, "prevention": null}
        });
        let ck: ConceptKnowledge = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&ck).unwrap(), json);

        let foreign = json!({
            "concept": "Stack Overflow",
            "type": "Pitfall",
            "knowledge": {"summary": "x"}
        });
        assert!(serde_json::from_value::<ConceptKnowledge>(foreign).is_err());
    }

    #[test]
    fn blank_concept_name_fails_fast() {
        let err = ConceptKnowledge::try_new("  ", Knowledge::empty(ConceptType::Principle))
            .unwrap_err();
        assert_eq!(err, KnowledgeError::MissingConcept);

        let err = ConceptKnowledge::from_reply(
            &json!(["not", "an", "object"]),
            &Concept::new("LIFO", ConceptType::Principle),
        )
        .unwrap_err();
        assert_eq!(err, KnowledgeError::NotAnObject);
    }
}
