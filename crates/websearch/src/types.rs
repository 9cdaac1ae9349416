use serde::{Deserialize, Serialize};

/// Well-known placeholder used when a result carries no real URL (§3).
pub const NO_SOURCE: &str = "no-source";

/// One web search result (§3 `WebResult`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    /// Set on the synthetic "search suggestion" result emitted when every
    /// provider comes back empty (§4.7 step 5). Not a breaker success, but
    /// real enough for C8 to score.
    pub is_suggestion: bool,
}

impl WebResult {
    pub fn suggestion(query: &str, canonical_search_url: &str) -> Self {
        Self {
            title: "Search suggestion".to_string(),
            snippet: format!(
                "I couldn't find a confident answer for \"{query}\" from my configured sources. \
                 Try searching directly for more detail."
            ),
            url: format!("{canonical_search_url}{}", urlencode(query)),
            is_suggestion: true,
        }
    }
}

fn urlencode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}
