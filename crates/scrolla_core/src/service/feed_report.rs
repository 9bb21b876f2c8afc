//! Quality report over a curated feed.

use crate::model::atom::AtomFeed;
use crate::text::word_count;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};

const NEAR_DUPLICATE_THRESHOLD: f32 = 0.8;
const SHORT_ATOM_WORDS: usize = 5;
const LONG_ATOM_WORDS: usize = 50;
const PREVIEW_CHARS: usize = 50;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct ReadTimeStats {
    pub average: f32,
    pub max: u32,
    pub min: u32,
}

/// Near-duplicate content pair by atom position.
#[derive(Debug, Clone, PartialEq)]
pub struct NearDuplicate {
    pub first: usize,
    pub second: usize,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedReport {
    pub topic: String,
    pub total: usize,
    pub type_counts: BTreeMap<String, usize>,
    /// Contents appearing more than once, in first-appearance order.
    pub exact_duplicates: Vec<String>,
    pub near_duplicates: Vec<NearDuplicate>,
    pub read_time: Option<ReadTimeStats>,
    pub short_atoms: usize,
    pub long_atoms: usize,
}

impl FeedReport {
    pub fn from_feed(feed: &AtomFeed) -> Self {
        let mut type_counts = BTreeMap::new();
        for atom in &feed.atoms {
            *type_counts
                .entry(atom.atom_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let contents: Vec<&str> = feed.atoms.iter().map(|atom| atom.content.as_str()).collect();

        let mut exact_duplicates = Vec::new();
        for (index, content) in contents.iter().enumerate() {
            let first_seen = contents.iter().position(|other| other == content) == Some(index);
            let repeated = contents.iter().filter(|other| *other == content).count() > 1;
            if first_seen && repeated {
                exact_duplicates.push(content.to_string());
            }
        }

        let tokens: Vec<HashSet<String>> = contents.iter().map(|content| tokenize(content)).collect();
        let mut absorbed = HashSet::new();
        let mut near_duplicates = Vec::new();
        for first in 0..tokens.len() {
            for second in (first + 1)..tokens.len() {
                if absorbed.contains(&first) || absorbed.contains(&second) {
                    continue;
                }
                let similarity = jaccard(&tokens[first], &tokens[second]);
                if similarity > NEAR_DUPLICATE_THRESHOLD {
                    near_duplicates.push(NearDuplicate {
                        first,
                        second,
                        similarity,
                    });
                    absorbed.insert(second);
                }
            }
        }

        let times: Vec<u32> = feed
            .atoms
            .iter()
            .map(|atom| atom.estimated_read_time_sec)
            .collect();
        let read_time = match (times.iter().max(), times.iter().min()) {
            (Some(&max), Some(&min)) => Some(ReadTimeStats {
                average: times.iter().sum::<u32>() as f32 / times.len() as f32,
                max,
                min,
            }),
            _ => None,
        };

        Self {
            topic: feed.topic.clone(),
            total: feed.len(),
            type_counts,
            exact_duplicates,
            near_duplicates,
            read_time,
            short_atoms: contents
                .iter()
                .filter(|content| word_count(content) < SHORT_ATOM_WORDS)
                .count(),
            long_atoms: contents
                .iter()
                .filter(|content| word_count(content) > LONG_ATOM_WORDS)
                .count(),
        }
    }
}

fn tokenize(content: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(&content.to_lowercase())
        .map(|word| word.as_str().to_string())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.intersection(b).count() as f32 / a.union(b).count() as f32
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

impl Display for FeedReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Topic: {}", self.topic)?;
        writeln!(f, "Total atoms: {}", self.total)?;
        writeln!(f, "Atom types:")?;
        for (atom_type, count) in &self.type_counts {
            writeln!(f, "  - {atom_type}: {count}")?;
        }
        writeln!(f, "Exact duplicates: {}", self.exact_duplicates.len())?;
        for content in &self.exact_duplicates {
            writeln!(f, "  - {}...", preview(content))?;
        }
        writeln!(f, "Near duplicates (jaccard > {NEAR_DUPLICATE_THRESHOLD}): {}", self.near_duplicates.len())?;
        for pair in &self.near_duplicates {
            writeln!(
                f,
                "  - [{:.2}] atoms {} and {}",
                pair.similarity,
                pair.first + 1,
                pair.second + 1
            )?;
        }
        if let Some(stats) = &self.read_time {
            writeln!(
                f,
                "Read time: avg {:.2}s, max {}s, min {}s",
                stats.average, stats.max, stats.min
            )?;
        }
        writeln!(f, "Very short atoms (< {SHORT_ATOM_WORDS} words): {}", self.short_atoms)?;
        write!(f, "Very long atoms (> {LONG_ATOM_WORDS} words): {}", self.long_atoms)
    }
}
