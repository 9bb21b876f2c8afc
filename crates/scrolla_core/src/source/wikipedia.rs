//! Wikipedia plain-text extracts via the MediaWiki API.

use super::{SourceProvider, SourceRole};
use log::{info, warn};
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_LIMIT: &str = "5";
const USER_AGENT: &str = concat!("scrolla/", env!("CARGO_PKG_VERSION"));

/// Fetches the page extract for a topic, falling back to the first search
/// hit when no page has that exact title.
pub struct WikipediaSource {
    api_url: String,
    http: Option<HttpClient>,
}

impl WikipediaSource {
    pub fn new() -> Self {
        Self::with_api_url(DEFAULT_API_URL)
    }

    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| {
                warn!(
                    "event=source_init module=source status=error source=wikipedia error={}",
                    err
                );
            })
            .ok();
        Self {
            api_url: api_url.into(),
            http,
        }
    }

    fn try_fetch(&self, http: &HttpClient, topic: &str) -> Result<String, reqwest::Error> {
        if let Some(extract) = self.page_extract(http, topic)? {
            return Ok(extract);
        }

        warn!(
            "event=source_fetch module=source status=fallback source=wikipedia reason=page_not_found"
        );
        let Some(title) = self.first_search_hit(http, topic)? else {
            return Ok(String::new());
        };
        info!("event=source_fetch module=source source=wikipedia page=\"{title}\"");
        Ok(self.page_extract(http, &title)?.unwrap_or_default())
    }

    fn page_extract(&self, http: &HttpClient, title: &str) -> Result<Option<String>, reqwest::Error> {
        let body: Value = http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", title),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        let extract = body
            .pointer("/query/pages")
            .and_then(Value::as_object)
            .and_then(|pages| pages.values().next())
            .filter(|page| page.get("missing").is_none())
            .and_then(|page| page.get("extract"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|extract| !extract.trim().is_empty());
        Ok(extract)
    }

    fn first_search_hit(&self, http: &HttpClient, topic: &str) -> Result<Option<String>, reqwest::Error> {
        let body: Value = http
            .get(&self.api_url)
            .query(&[
                ("action", "opensearch"),
                ("search", topic),
                ("limit", SEARCH_LIMIT),
                ("format", "json"),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        Ok(body
            .get(1)
            .and_then(Value::as_array)
            .and_then(|titles| titles.first())
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

impl Default for WikipediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceProvider for WikipediaSource {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn role(&self) -> SourceRole {
        SourceRole::Authoritative
    }

    fn fetch(&self, topic: &str) -> String {
        let Some(http) = &self.http else {
            return String::new();
        };
        match self.try_fetch(http, topic) {
            Ok(text) => clean_wiki_text(&text),
            Err(err) => {
                warn!(
                    "event=source_fetch module=source status=error source=wikipedia error={}",
                    err
                );
                String::new()
            }
        }
    }
}

/// Drops blank lines, section headings and citation (ISBN) lines.
pub fn clean_wiki_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("==") && !line.contains("ISBN"))
        .collect::<Vec<_>>()
        .join("\n")
}
