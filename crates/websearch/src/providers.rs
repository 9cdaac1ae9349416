//! Concrete [`SearchProvider`] implementations. Grounded in the teacher's
//! `WebSearchTool` (`examples/danielmriley-aigent/crates/tools/src/builtins/web.rs`):
//! a short-timeout `reqwest::Client`, a fixed user agent, and JSON field
//! picking rather than a generated API client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::provider::SearchProvider;
use crate::types::WebResult;

const USER_AGENT: &str = "hybrid-response-pipeline/0.1";

/// Encyclopedic summary provider — DuckDuckGo's Instant Answer API, which
/// needs no API key and mirrors Wikipedia-style abstract summaries.
pub struct WikipediaProvider {
    client: reqwest::Client,
}

impl WikipediaProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent(USER_AGENT)
                .build()
                .expect("building reqwest client"),
        }
    }
}

impl Default for WikipediaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for WikipediaProvider {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, query: &str, n: usize) -> anyhow::Result<Vec<WebResult>> {
        let resp = self
            .client
            .get("https://en.wikipedia.org/w/api.php")
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srsearch", query),
                ("srlimit", &n.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = resp.json().await?;
        let hits = body["query"]["search"].as_array().cloned().unwrap_or_default();

        let results = hits
            .into_iter()
            .take(n)
            .filter_map(|hit| {
                let title = hit["title"].as_str()?.to_string();
                let snippet = strip_html(hit["snippet"].as_str().unwrap_or(""));
                let url = format!(
                    "https://en.wikipedia.org/wiki/{}",
                    title.replace(' ', "_")
                );
                Some(WebResult { title, snippet, url, is_suggestion: false })
            })
            .collect();

        Ok(results)
    }
}

/// General-purpose fallback — DuckDuckGo's Instant Answer API abstract +
/// related topics, same shape as the teacher's `search_duckduckgo`.
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent(USER_AGENT)
                .build()
                .expect("building reqwest client"),
        }
    }
}

impl Default for DuckDuckGoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, n: usize) -> anyhow::Result<Vec<WebResult>> {
        let resp = self
            .client
            .get("https://api.duckduckgo.com/")
            .query(&[("q", query), ("format", "json"), ("no_html", "1"), ("skip_disambig", "1")])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = resp.json().await?;

        let mut results = Vec::new();

        let abstract_text = body["AbstractText"].as_str().unwrap_or("").trim();
        if !abstract_text.is_empty() {
            let abstract_url = body["AbstractURL"].as_str().unwrap_or("").trim();
            let source = body["AbstractSource"].as_str().unwrap_or("DuckDuckGo");
            results.push(WebResult {
                title: source.to_string(),
                snippet: abstract_text.to_string(),
                url: if abstract_url.is_empty() { crate::types::NO_SOURCE.to_string() } else { abstract_url.to_string() },
                is_suggestion: false,
            });
        }

        if let Some(topics) = body["RelatedTopics"].as_array() {
            for topic in topics.iter() {
                if results.len() >= n {
                    break;
                }
                let text = topic["Text"].as_str().unwrap_or("").trim();
                if text.is_empty() {
                    continue;
                }
                let url = topic["FirstURL"].as_str().unwrap_or(crate::types::NO_SOURCE);
                results.push(WebResult {
                    title: text.chars().take(80).collect(),
                    snippet: text.to_string(),
                    url: url.to_string(),
                    is_suggestion: false,
                });
            }
        }

        results.truncate(n);
        Ok(results)
    }
}

fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
