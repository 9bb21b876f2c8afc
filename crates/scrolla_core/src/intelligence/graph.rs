//! Mention graph over resolved concept knowledge.

use crate::model::knowledge::ConceptKnowledge;

/// Directed graph where `a -> b` means `a`'s knowledge text mentions `b`.
#[derive(Debug, Clone, Default)]
pub struct ConceptGraph {
    edges: Vec<Vec<usize>>,
}

impl ConceptGraph {
    pub fn build(records: &[ConceptKnowledge]) -> Self {
        let names: Vec<String> = records
            .iter()
            .map(|record| record.concept.to_lowercase())
            .collect();
        let edges = records
            .iter()
            .enumerate()
            .map(|(from, record)| {
                let text = record.knowledge.text_blob().to_lowercase();
                names
                    .iter()
                    .enumerate()
                    .filter(|(to, name)| *to != from && !name.is_empty() && text.contains(*name))
                    .map(|(to, _)| to)
                    .collect()
            })
            .collect();
        Self { edges }
    }

    /// Out-degree of `index`; `0` for unknown nodes.
    pub fn centrality(&self, index: usize) -> usize {
        self.edges.get(index).map_or(0, Vec::len)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::ConceptGraph;
    use crate::model::concept::ConceptType;
    use crate::model::knowledge::{ConceptKnowledge, Knowledge};
    use crate::text::Text;

    fn record(name: &str, field: &str, text: Text) -> ConceptKnowledge {
        let kind = if field == "action" {
            ConceptType::Operation
        } else {
            ConceptType::Definition
        };
        let mut knowledge = Knowledge::empty(kind);
        *knowledge.field_mut(field).unwrap() = Some(text);
        ConceptKnowledge::try_new(name, knowledge).unwrap()
    }

    #[test]
    fn edges_follow_mentions_in_text_and_list_fields() {
        let records = vec![
            record("Stack", "what_it_is", Text::from("A LIFO collection supporting push")),
            record("Push", "action", Text::Lines(vec!["Adds onto the stack".to_string()])),
            record("Heap", "what_it_is", Text::from("A tree")),
        ];
        let graph = ConceptGraph::build(&records);

        assert_eq!(graph.centrality(0), 1);
        assert_eq!(graph.centrality(1), 1);
        assert_eq!(graph.centrality(2), 0);
        assert_eq!(graph.edge_count(), 2);
    }
}
