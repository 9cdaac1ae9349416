//! Confidence Assessor (C8): scores web results for relevance before they
//! are fused into the prompt (§4.8). Pure and deterministic, same table
//! shape as C6.

use hrp_websearch::WebResult;

use crate::types::{Assessment, Recommendation};

struct WebFeatures {
    has_results: bool,
    total_content_len: usize,
    has_absolute_url: bool,
    overlap_ratio: f32,
}

#[derive(Default)]
pub struct ConfidenceAssessor;

impl ConfidenceAssessor {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, results: &[WebResult], query: &str) -> Assessment {
        let features = extract_features(results, query);

        for (predicate, confidence, recommendation, reason) in rules() {
            if predicate(&features) {
                return Assessment::new(confidence, recommendation, reason);
            }
        }
        Assessment::invalid("no_rule_matched")
    }
}

fn extract_features(results: &[WebResult], query: &str) -> WebFeatures {
    if results.is_empty() {
        return WebFeatures {
            has_results: false,
            total_content_len: 0,
            has_absolute_url: false,
            overlap_ratio: 0.0,
        };
    }

    let total_content_len: usize = results.iter().map(|r| r.snippet.len()).sum();
    let has_absolute_url = results
        .iter()
        .any(|r| r.url.starts_with("http://") || r.url.starts_with("https://"));

    let query_words: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .map(|w| w.to_string())
        .collect();

    let overlap_ratio = if query_words.is_empty() {
        0.0
    } else {
        let best = results
            .iter()
            .map(|r| {
                let content_lower = r.snippet.to_lowercase();
                let matches = query_words.iter().filter(|w| content_lower.contains(w.as_str())).count();
                matches as f32 / query_words.len() as f32
            })
            .fold(0.0_f32, f32::max);
        best
    };

    WebFeatures {
        has_results: true,
        total_content_len,
        has_absolute_url,
        overlap_ratio,
    }
}

#[allow(clippy::type_complexity)]
fn rules() -> Vec<(Box<dyn Fn(&WebFeatures) -> bool>, f32, Recommendation, &'static str)> {
    vec![
        (
            Box::new(|f: &WebFeatures| !f.has_results),
            0.0,
            Recommendation::AskForClarification,
            "no_web_results",
        ),
        (
            Box::new(|f: &WebFeatures| f.total_content_len >= 500 && f.has_absolute_url && f.overlap_ratio >= 0.3),
            0.8,
            Recommendation::UseWeb,
            "good_web_results",
        ),
        (
            Box::new(|f: &WebFeatures| f.total_content_len >= 200 && f.overlap_ratio > 0.0),
            0.6,
            Recommendation::UseWeb,
            "moderate_web_results",
        ),
        (
            Box::new(|f: &WebFeatures| f.total_content_len >= 100),
            0.4,
            Recommendation::UseWebWithCaution,
            "basic_web_results",
        ),
        (
            Box::new(|_: &WebFeatures| true),
            0.2,
            Recommendation::AskForClarification,
            "poor_web_results",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, snippet: &str, url: &str) -> WebResult {
        WebResult {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
            is_suggestion: false,
        }
    }

    #[test]
    fn no_results_asks_for_clarification() {
        let a = ConfidenceAssessor::new().assess(&[], "query");
        assert_eq!(a.confidence, 0.0);
        assert_eq!(a.recommendation, Recommendation::AskForClarification);
    }

    #[test]
    fn rich_overlapping_results_use_web() {
        let snippet = format!("{} {}", "hamilton career total podiums statistics ".repeat(20), "x".repeat(100));
        let results = vec![result("F1 stats", &snippet, "https://example.com/hamilton")];
        let a = ConfidenceAssessor::new().assess(&results, "hamilton career total podiums");
        assert_eq!(a.recommendation, Recommendation::UseWeb);
        assert_eq!(a.confidence, 0.8);
    }

    #[test]
    fn moderate_results_without_url_still_use_web() {
        let snippet = format!("hamilton podiums total career {}", "y".repeat(200));
        let results = vec![result("title", &snippet, "no-source")];
        let a = ConfidenceAssessor::new().assess(&results, "hamilton podiums total");
        assert_eq!(a.recommendation, Recommendation::UseWeb);
        assert_eq!(a.confidence, 0.6);
    }

    #[test]
    fn thin_results_use_web_with_caution() {
        let results = vec![result("title", &"z".repeat(110), "no-source")];
        let a = ConfidenceAssessor::new().assess(&results, "totally unrelated words here");
        assert_eq!(a.recommendation, Recommendation::UseWebWithCaution);
        assert_eq!(a.confidence, 0.4);
    }

    #[test]
    fn negligible_results_ask_for_clarification() {
        let results = vec![result("title", "short", "no-source")];
        let a = ConfidenceAssessor::new().assess(&results, "query");
        assert_eq!(a.recommendation, Recommendation::AskForClarification);
        assert_eq!(a.confidence, 0.2);
    }

    #[test]
    fn assess_is_deterministic() {
        let results = vec![result("title", &"z".repeat(150), "https://x")];
        let a1 = ConfidenceAssessor::new().assess(&results, "query words");
        let a2 = ConfidenceAssessor::new().assess(&results, "query words");
        assert_eq!(a1, a2);
    }
}
