//! Atom quality gate.
//!
//! # Responsibility
//! - Reject atoms that are too short, too long, too wordy in sentences,
//!   malformed quizzes, or that leak source references.
//!
//! # Invariants
//! - Pure: no logging, no mutation.

use crate::model::atom::{Atom, AtomType};
use crate::text::word_count;
use once_cell::sync::Lazy;
use regex::Regex;

const MIN_WORDS: usize = 3;
const DEFAULT_MAX_WORDS: usize = 30;
const MAX_SENTENCES: usize = 2;
const MAX_MENTAL_MODEL_SENTENCES: usize = 1;

static SENTENCE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));
static FORBIDDEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://|wikipedia|according to|this article|source:")
        .expect("valid forbidden-pattern regex")
});

/// Why an atom was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomRejection {
    TooShort { words: usize },
    TooLong { words: usize, max: usize },
    TooManySentences { sentences: usize, max: usize },
    QuizNotQuestion,
    SourceLeak,
}

impl AtomRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "too_short",
            Self::TooLong { .. } => "too_long",
            Self::TooManySentences { .. } => "too_many_sentences",
            Self::QuizNotQuestion => "quiz_not_question",
            Self::SourceLeak => "source_leak",
        }
    }
}

/// Word cap for `atom_type`.
pub fn max_words(atom_type: &AtomType) -> usize {
    match atom_type {
        AtomType::Explanation => 90,
        AtomType::MentalModel => 50,
        AtomType::Example => 70,
        AtomType::Pitfall => 90,
        AtomType::QuickCheck => 30,
        AtomType::KeyPoints => 80,
        AtomType::Steps => 90,
        AtomType::EdgeCases => 80,
        AtomType::WhyItMatters => 70,
        AtomType::Intuition => 70,
        AtomType::Comparison => 80,
        AtomType::Impact => 80,
        AtomType::Prevention => 80,
        AtomType::RealWorldUse => 70,
        AtomType::WhySuitable => 60,
        _ => DEFAULT_MAX_WORDS,
    }
}

/// First failing rule, or `None` when the atom is acceptable.
pub fn rejection_reason(atom: &Atom) -> Option<AtomRejection> {
    let content = atom.content.trim();
    let words = word_count(content);
    if words < MIN_WORDS {
        return Some(AtomRejection::TooShort { words });
    }

    let max = max_words(&atom.atom_type);
    if words > max {
        return Some(AtomRejection::TooLong { words, max });
    }

    let sentences = SENTENCE_BREAK_RE
        .split(content)
        .filter(|sentence| !sentence.trim().is_empty())
        .count();
    let max_sentences = if atom.atom_type == AtomType::MentalModel {
        MAX_MENTAL_MODEL_SENTENCES
    } else {
        MAX_SENTENCES
    };
    if sentences > max_sentences {
        return Some(AtomRejection::TooManySentences {
            sentences,
            max: max_sentences,
        });
    }

    if atom.atom_type.is_quiz() && !content.ends_with('?') {
        return Some(AtomRejection::QuizNotQuestion);
    }

    if FORBIDDEN_RE.is_match(&content.to_lowercase()) {
        return Some(AtomRejection::SourceLeak);
    }

    None
}

pub fn accept_atom(atom: &Atom) -> bool {
    rejection_reason(atom).is_none()
}
