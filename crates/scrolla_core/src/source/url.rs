//! Reference pages fetched over HTTP.
//!
//! # Invariants
//! - Markup is stripped before the text is cut to `REFERENCE_FETCH_CHARS`.
//! - Any transport or status failure yields empty text.

use super::{truncate_chars, SourceProvider, SourceRole};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client as HttpClient;
use std::time::Duration;

/// Characters kept from one fetched page.
pub const REFERENCE_FETCH_CHARS: usize = 3000;
/// Replaced by the hyphenated, lowercase topic in a URL template.
pub const TOPIC_PLACEHOLDER: &str = "{topic}";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("scrolla/", env!("CARGO_PKG_VERSION"));

static SKIPPED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->")
        .expect("valid skipped block regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static SPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\x{a0}]+").expect("valid space run regex"));

const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Secondary text from a fixed page or a per-topic URL template such as
/// `https://www.geeksforgeeks.org/{topic}/`.
pub struct UrlSource {
    url: String,
    http: Option<HttpClient>,
}

impl UrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| {
                warn!(
                    "event=source_init module=source status=error source=url error={}",
                    err
                );
            })
            .ok();
        Self {
            url: url.into(),
            http,
        }
    }

    fn try_fetch(&self, http: &HttpClient, url: &str) -> Result<String, reqwest::Error> {
        http.get(url).send()?.error_for_status()?.text()
    }
}

impl SourceProvider for UrlSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn role(&self) -> SourceRole {
        SourceRole::Reference
    }

    fn fetch(&self, topic: &str) -> String {
        let Some(http) = &self.http else {
            return String::new();
        };
        let url = resolve_url(&self.url, topic);
        match self.try_fetch(http, &url) {
            Ok(body) => truncate_chars(&html_to_text(&body), REFERENCE_FETCH_CHARS).to_string(),
            Err(err) => {
                warn!(
                    "event=source_fetch module=source status=error source=url url=\"{}\" error={}",
                    url, err
                );
                String::new()
            }
        }
    }
}

/// Fills `{topic}` with the topic's words, lowercased and hyphen-joined.
pub fn resolve_url(template: &str, topic: &str) -> String {
    if !template.contains(TOPIC_PLACEHOLDER) {
        return template.to_string();
    }
    let slug = topic
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    template.replace(TOPIC_PLACEHOLDER, &slug)
}

/// Drops scripts, styles, comments and tags, decodes common entities and
/// keeps one trimmed, non-empty line per text line.
pub fn html_to_text(html: &str) -> String {
    let without_blocks = SKIPPED_BLOCK_RE.replace_all(html, " ");
    let mut text = TAG_RE.replace_all(&without_blocks, "\n").into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }
    text.lines()
        .map(|line| SPACE_RUN_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
