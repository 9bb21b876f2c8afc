//! Stemmed identity keys for concept names.
//!
//! Two concept names denote the same concept iff their stems are equal, so
//! "Insertion" and "Insert" share one cache slot and one feed group.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};

static ENGLISH_STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Lowercases, stems each whitespace token and rejoins with single spaces.
pub fn stem(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .map(|token| ENGLISH_STEMMER.stem(token).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
