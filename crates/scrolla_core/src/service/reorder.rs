//! Repair an existing feed's concept order.
//!
//! # Responsibility
//! - Regroup stored atoms so concepts follow a reference order.
//!
//! # Invariants
//! - Atoms keep their relative order within a concept group.
//! - Concepts missing from the reference order are appended in
//!   first-appearance order.
//! - Output `order` values are exactly `1..=len`.

use crate::model::atom::{Atom, AtomFeed};
use crate::text::stem;
use log::{info, warn};
use std::collections::HashMap;

/// What a reorder pass matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderReport {
    /// Reference concepts that had atoms, in emitted order.
    pub matched: Vec<String>,
    /// Reference concepts without any atoms.
    pub missing: Vec<String>,
    /// Feed concepts absent from the reference, with their atom counts.
    pub orphaned: Vec<(String, usize)>,
}

/// Reorders `feed` so concept groups follow `concept_order` (matched by
/// stem).
pub fn reorder_feed(feed: AtomFeed, concept_order: &[String]) -> (AtomFeed, ReorderReport) {
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Atom>> = HashMap::new();
    for atom in feed.atoms {
        let key = stem(&atom.concept);
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                group_order.push(key);
                Vec::new()
            })
            .push(atom);
    }

    let mut report = ReorderReport::default();
    let mut atoms = Vec::new();
    for expected in concept_order {
        match groups.remove(&stem(expected)) {
            Some(group) => {
                report.matched.push(expected.clone());
                atoms.extend(group);
            }
            None => {
                warn!(
                    "event=reorder_missing module=reorder concept=\"{}\"",
                    expected
                );
                report.missing.push(expected.clone());
            }
        }
    }

    for key in group_order {
        if let Some(group) = groups.remove(&key) {
            let name = group
                .first()
                .map(|atom| atom.concept.clone())
                .unwrap_or(key);
            warn!(
                "event=reorder_orphan module=reorder concept=\"{}\" atoms={}",
                name,
                group.len()
            );
            report.orphaned.push((name, group.len()));
            atoms.extend(group);
        }
    }

    let mut reordered = AtomFeed::new(feed.topic, atoms);
    reordered.assign_dense_order();
    info!(
        "event=reorder_feed module=reorder status=ok atoms={} matched={} missing={} orphaned={}",
        reordered.len(),
        report.matched.len(),
        report.missing.len(),
        report.orphaned.len()
    );
    (reordered, report)
}

#[cfg(test)]
mod tests {
    use super::reorder_feed;
    use crate::model::atom::{Atom, AtomFeed, AtomType};

    fn atom(concept: &str, atom_type: AtomType) -> Atom {
        Atom::new("Stack", concept, atom_type, "content text here")
    }

    #[test]
    fn follows_reference_order_and_appends_orphans() {
        let feed = AtomFeed::new(
            "Stack",
            vec![
                atom("Pop", AtomType::Explanation),
                atom("Overflow", AtomType::Explanation),
                atom("Pushing", AtomType::Explanation),
                atom("Pop", AtomType::QuickCheck),
                atom("Underflow", AtomType::Explanation),
            ],
        );
        let order = vec!["Push".to_string(), "Pop".to_string(), "Peek".to_string()];

        let (reordered, report) = reorder_feed(feed, &order);
        let shape: Vec<(&str, u32)> = reordered
            .atoms
            .iter()
            .map(|a| (a.concept.as_str(), a.order))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Pushing", 1),
                ("Pop", 2),
                ("Pop", 3),
                ("Overflow", 4),
                ("Underflow", 5),
            ]
        );
        assert_eq!(reordered.atoms[2].atom_type, AtomType::QuickCheck);
        assert_eq!(report.matched, vec!["Push".to_string(), "Pop".to_string()]);
        assert_eq!(report.missing, vec!["Peek".to_string()]);
        assert_eq!(
            report.orphaned,
            vec![("Overflow".to_string(), 1), ("Underflow".to_string(), 1)]
        );
    }
}
