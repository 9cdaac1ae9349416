//! Sufficiency Assessor (C6): scores retrieved RAG context against query
//! intent and recommends a routing decision. Pure, deterministic, and the
//! single testable hinge of the pipeline (§4.6).
//!
//! The decision table is implemented literally as an ordered list of
//! `(predicate, confidence, recommendation, reason)` entries evaluated in
//! sequence — the first predicate that matches wins — per §9's design note
//! against hand-written if/else ladders.

use std::collections::HashSet;

use hrp_config::SufficiencyConfig;
use hrp_retrieval::Chunk;
use regex::Regex;

use crate::types::{Assessment, Recommendation};

const DATE_NUMBER_PATTERN: &str = r"\d+\.?\d*\s*(points|goals|wins|losses|games|%|percent|podiums?|finishes?)";
const DATE_PATTERN: &str = r"\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/]\d{1,2}[-/]\d{4}|\b(19|20)\d{2}\b";
const YEAR_PATTERN: &str = r"\b(19|20)\d{2}\b";

/// Precomputed facts about a query + its retrieved chunks, consulted by
/// every row of the decision table so each predicate stays a one-liner.
struct QueryFeatures {
    chunks_empty: bool,
    has_override: bool,
    is_statistical: bool,
    is_career_wide: bool,
    year_coverage: usize,
    chunks_mention_career_keyword: bool,
    has_dates: bool,
    has_numbers: bool,
    total_content_len: usize,
    avg_distance: f32,
}

/// Sufficiency Assessor (C6).
pub struct SufficiencyAssessor {
    statistical_patterns: Vec<Regex>,
    career_indicators: Vec<String>,
    date_number_re: Regex,
    date_re: Regex,
    year_re: Regex,
}

impl SufficiencyAssessor {
    pub fn new(config: &SufficiencyConfig) -> Self {
        let statistical_patterns = config
            .statistical_patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            statistical_patterns,
            career_indicators: config.career_indicators.iter().map(|s| s.to_lowercase()).collect(),
            date_number_re: Regex::new(DATE_NUMBER_PATTERN).expect("valid regex"),
            date_re: Regex::new(DATE_PATTERN).expect("valid regex"),
            year_re: Regex::new(YEAR_PATTERN).expect("valid regex"),
        }
    }

    pub fn assess(&self, query: &str, chunks: &[Chunk]) -> Assessment {
        let features = self.extract_features(query, chunks);

        for (predicate, confidence, recommendation, reason) in self.rules() {
            if predicate(&features) {
                return Assessment::new_with_statistical(confidence, recommendation, reason, features.is_statistical);
            }
        }

        // Unreachable: the final row is an unconditional catch-all.
        Assessment::invalid("no_rule_matched")
    }

    fn is_statistical(&self, query_lower: &str) -> bool {
        self.statistical_patterns.iter().any(|re| re.is_match(query_lower))
    }

    fn extract_features(&self, query: &str, chunks: &[Chunk]) -> QueryFeatures {
        let query_lower = query.to_lowercase();
        let is_statistical = self.is_statistical(&query_lower);
        let has_override = chunks.iter().any(|c| c.metadata.is_override);

        let query_has_year = self.year_re.is_match(&query_lower);
        let query_has_career_indicator = self
            .career_indicators
            .iter()
            .any(|indicator| query_lower.contains(indicator.as_str()));
        // "a query containing both indicators is treated as season-specific" (§4.6).
        let is_career_wide = query_has_career_indicator && !query_has_year;

        let combined_content: String = chunks
            .iter()
            .map(|c| c.content.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let mut years: HashSet<String> = HashSet::new();
        for cap in self.year_re.find_iter(&combined_content) {
            years.insert(cap.as_str().to_string());
        }

        let chunks_mention_career_keyword = self
            .career_indicators
            .iter()
            .any(|indicator| combined_content.contains(indicator.as_str()));

        let has_dates = chunks.iter().any(|c| self.date_re.is_match(&c.content));
        let has_numbers = chunks.iter().any(|c| self.date_number_re.is_match(&c.content.to_lowercase()));

        let total_content_len: usize = chunks.iter().map(|c| c.content.len()).sum();
        let avg_distance = if chunks.is_empty() {
            0.0
        } else {
            chunks.iter().map(|c| c.distance).sum::<f32>() / chunks.len() as f32
        };

        QueryFeatures {
            chunks_empty: chunks.is_empty(),
            has_override,
            is_statistical,
            is_career_wide,
            year_coverage: years.len(),
            chunks_mention_career_keyword,
            has_dates,
            has_numbers,
            total_content_len,
            avg_distance,
        }
    }

    #[allow(clippy::type_complexity)]
    fn rules(&self) -> Vec<(Box<dyn Fn(&QueryFeatures) -> bool>, f32, Recommendation, &'static str)> {
        vec![
            (
                Box::new(|f: &QueryFeatures| f.chunks_empty),
                0.0,
                Recommendation::WebSearch,
                "no_rag_results",
            ),
            (
                Box::new(|f: &QueryFeatures| f.has_override && !f.is_statistical),
                0.9,
                Recommendation::UseRag,
                "override_present",
            ),
            (
                Box::new(|f: &QueryFeatures| f.is_statistical && f.has_dates && f.has_numbers),
                0.8,
                Recommendation::UseRag,
                "specific_data_available",
            ),
            (
                Box::new(|f: &QueryFeatures| {
                    f.is_statistical && f.is_career_wide && f.year_coverage < 2 && !f.chunks_mention_career_keyword
                }),
                0.2,
                Recommendation::WebSearch,
                "insufficient_career_data",
            ),
            (
                Box::new(|f: &QueryFeatures| f.is_statistical),
                0.3,
                Recommendation::WebSearch,
                "insufficient_specific_data",
            ),
            (
                Box::new(|f: &QueryFeatures| f.total_content_len > 300 && f.avg_distance < 0.6),
                0.7,
                Recommendation::UseRag,
                "good_general_context",
            ),
            (
                Box::new(|f: &QueryFeatures| f.total_content_len > 100 && f.avg_distance < 0.8),
                0.5,
                Recommendation::UseRagWithWebFallback,
                "moderate_context",
            ),
            (
                Box::new(|_: &QueryFeatures| true),
                0.2,
                Recommendation::WebSearch,
                "low_relevance_or_content",
            ),
        ]
    }
}
