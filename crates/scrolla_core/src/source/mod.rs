//! Source text providers and merged context assembly.
//!
//! # Responsibility
//! - Fetch raw reference text for a topic from pluggable providers.
//! - Merge provider output into one bounded extraction context.
//!
//! # Invariants
//! - `SourceProvider::fetch` never fails; provider errors become empty text.
//! - Authoritative text precedes reference text in the merged context.

use log::info;

mod local;
mod url;
mod wikipedia;

pub use local::{FileSource, StaticSource};
pub use url::{html_to_text, resolve_url, UrlSource, REFERENCE_FETCH_CHARS};
pub use wikipedia::{clean_wiki_text, WikipediaSource};

/// Authoritative sources keep this many characters in the merged context.
pub const AUTHORITATIVE_CHARS: usize = 4000;
/// Reference sources keep this many characters in the merged context.
pub const REFERENCE_CHARS: usize = 1000;

/// How much a source is trusted when building context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    Authoritative,
    Reference,
}

impl SourceRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authoritative => "authoritative",
            Self::Reference => "reference",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "authoritative" => Some(Self::Authoritative),
            "reference" => Some(Self::Reference),
            _ => None,
        }
    }

    fn char_budget(self) -> usize {
        match self {
            Self::Authoritative => AUTHORITATIVE_CHARS,
            Self::Reference => REFERENCE_CHARS,
        }
    }
}

/// Supplies raw text about a topic.
pub trait SourceProvider {
    fn name(&self) -> &str;

    fn role(&self) -> SourceRole {
        SourceRole::Authoritative
    }

    /// Returns the source text, or an empty string when unavailable.
    fn fetch(&self, topic: &str) -> String;
}

/// Text fetched from one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub name: String,
    pub role: SourceRole,
    pub text: String,
}

/// Fetches every provider in order.
pub fn fetch_all(providers: &[Box<dyn SourceProvider>], topic: &str) -> Vec<SourceText> {
    providers
        .iter()
        .map(|provider| {
            let text = provider.fetch(topic);
            info!(
                "event=source_fetch module=source source={} role={} chars={}",
                provider.name(),
                provider.role().as_str(),
                text.chars().count()
            );
            SourceText {
                name: provider.name().to_string(),
                role: provider.role(),
                text,
            }
        })
        .collect()
}

/// Joins non-empty sources with newlines: authoritative texts first, each
/// cut to its role's character budget.
pub fn build_merged_context(sources: &[SourceText]) -> String {
    [SourceRole::Authoritative, SourceRole::Reference]
        .into_iter()
        .flat_map(move |role| {
            sources
                .iter()
                .filter(move |source| source.role == role && !source.text.is_empty())
                .map(move |source| truncate_chars(&source.text, role.char_budget()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
