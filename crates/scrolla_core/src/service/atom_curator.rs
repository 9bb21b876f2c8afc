//! Atom feed curation: clean, dedupe and order.
//!
//! # Responsibility
//! - Normalize content and strip leaked quiz answers.
//! - Drop atoms left without content after cleaning.
//! - Keep one atom per (stemmed concept, atom type).
//! - Order atoms by concept, then by learning stage, with dense ranks.
//!
//! # Invariants
//! - Output `order` values are exactly `1..=len`.
//! - Atoms of one concept are contiguous in the output.

use crate::model::atom::{Atom, AtomFeed, AtomType};
use crate::text::{stem, strip_answer_leak, NormalizeMode, Text};
use std::collections::HashMap;

const UNKNOWN_STAGE: usize = 99;

/// Canonical position of `atom_type` in a concept's learning sequence.
pub fn stage_rank(atom_type: &AtomType) -> usize {
    match atom_type {
        AtomType::Explanation => 0,
        AtomType::MentalModel => 1,
        AtomType::Example => 2,
        AtomType::KeyPoints => 3,
        AtomType::Pitfall => 4,
        AtomType::WhyItMatters => 5,
        AtomType::QuickCheck => 6,
        _ => UNKNOWN_STAGE,
    }
}

/// Cleans, dedupes and orders `feed`.
///
/// On a duplicate (stemmed concept, atom type) the strictly longer content
/// replaces the earlier atom in its slot.
pub fn curate_feed(feed: AtomFeed) -> AtomFeed {
    let mut slots: HashMap<(String, AtomType), usize> = HashMap::new();
    let mut kept: Vec<(String, Atom)> = Vec::new();

    for mut atom in feed.atoms {
        let mut content = Text::Plain(atom.content).normalize(NormalizeMode::Curation);
        if atom.atom_type.is_quiz() {
            content = strip_answer_leak(&content);
        }
        if content.trim().is_empty() {
            continue;
        }
        atom.content = content;

        let concept_key = stem(&atom.concept);
        let key = (concept_key.clone(), atom.atom_type.clone());
        match slots.get(&key) {
            Some(&slot) => {
                if atom.content.chars().count() > kept[slot].1.content.chars().count() {
                    kept[slot].1 = atom;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push((concept_key, atom));
            }
        }
    }

    kept.sort_by(|(a_key, a), (b_key, b)| {
        a_key
            .cmp(b_key)
            .then_with(|| stage_rank(&a.atom_type).cmp(&stage_rank(&b.atom_type)))
    });

    let mut curated = AtomFeed::new(feed.topic, kept.into_iter().map(|(_, atom)| atom).collect());
    curated.assign_dense_order();
    curated
}
