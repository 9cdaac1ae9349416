//! Domain Classifier (C4): routes a query to zero, one, or multiple named
//! knowledge domains using keyword scoring, explicit-token overrides, an
//! ambiguity rule, and a sticky-domain rule that resists noisy switching.
//!
//! The classifier is pure with respect to a snapshot of the session's
//! "current domain": it never mutates anything itself. Any update to the
//! current domain is returned as part of [`ClassifyResult`] so the caller
//! can commit it atomically alongside the rest of the turn.

use hrp_config::PipelineConfig;
use serde::{Deserialize, Serialize};

const MIN_SWITCH_CONFIDENCE: f32 = 0.8;
const EXPLICIT_INDICATOR_CONFIDENCE: f32 = 0.95;
const AMBIGUOUS_WITH_CONTEXT_CONFIDENCE: f32 = 0.7;
const AMBIGUOUS_NO_CONTEXT_CONFIDENCE: f32 = 0.3;
const CLEAR_DETECTION_CONFIDENCE: f32 = 0.9;
const AMBIGUOUS_RATIO_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainReason {
    /// A high-signal token short-circuited to a domain (§4.4 step 3).
    ExplicitIndicator,
    /// Ambiguous query, resolved using the session's current domain.
    AmbiguousWithContext,
    /// Ambiguous query with no current domain to fall back on.
    AmbiguousNoContext,
    /// Top-scoring domain differs from current but confidence is too low to switch.
    StickyDomain,
    /// A clear, confident detection (including "no domain at all").
    ClearDetection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainVerdict {
    pub primary: Option<String>,
    pub secondary: Vec<String>,
    pub confidence: f32,
    pub reason: DomainReason,
    pub matched_tokens: Vec<String>,
    pub is_context_override: bool,
}

pub struct ClassifyResult {
    pub verdict: DomainVerdict,
    /// Set when the classifier determined the session's current domain
    /// should change; `None` means leave it untouched.
    pub new_current_domain: Option<String>,
}

struct DomainScore<'a> {
    name: &'a str,
    score: f32,
    matched: Vec<String>,
}

pub struct DomainClassifier<'a> {
    config: &'a PipelineConfig,
}

impl<'a> DomainClassifier<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, query: &str, current_domain: Option<&str>) -> ClassifyResult {
        let query_lower = query.to_lowercase();

        // Step 3: explicit-indicator override short-circuits everything else.
        if let Some(indicator) = self.find_explicit_indicator(&query_lower) {
            let verdict = DomainVerdict {
                primary: Some(indicator.domain.clone()),
                secondary: Vec::new(),
                confidence: EXPLICIT_INDICATOR_CONFIDENCE,
                reason: DomainReason::ExplicitIndicator,
                matched_tokens: vec![indicator.token.clone()],
                is_context_override: current_domain != Some(indicator.domain.as_str()),
            };
            return ClassifyResult {
                new_current_domain: Some(indicator.domain.clone()),
                verdict,
            };
        }

        let scores = self.score_domains(&query_lower);

        // Step 4: ambiguity rule, only reached when no explicit indicator fired.
        if self.is_ambiguous(&query_lower) {
            return match current_domain {
                Some(domain) => ClassifyResult {
                    verdict: DomainVerdict {
                        primary: Some(domain.to_string()),
                        secondary: Vec::new(),
                        confidence: AMBIGUOUS_WITH_CONTEXT_CONFIDENCE,
                        reason: DomainReason::AmbiguousWithContext,
                        matched_tokens: vec!["context-based".to_string()],
                        is_context_override: true,
                    },
                    new_current_domain: None,
                },
                None => ClassifyResult {
                    verdict: DomainVerdict {
                        primary: None,
                        secondary: Vec::new(),
                        confidence: AMBIGUOUS_NO_CONTEXT_CONFIDENCE,
                        reason: DomainReason::AmbiguousNoContext,
                        matched_tokens: Vec::new(),
                        is_context_override: false,
                    },
                    new_current_domain: None,
                },
            };
        }

        // `top_name` is `None` when nothing scored at all; it is carried
        // through the same sticky-domain branch below rather than
        // short-circuited, so a keyword-less turn with an already-active
        // current domain still resists switching away from it (matches
        // the Python original's `detect_domain_with_context`, which treats
        // a zero-keyword `base_detection` the same as any other detection).
        let top_name: Option<&str> = scores.first().map(|s| s.name);
        let total_matches: usize = scores.iter().map(|s| s.matched.len()).sum();

        // Step 5: sticky-domain rule.
        if let Some(current) = current_domain {
            if top_name != Some(current) {
                let switch_confidence = (0.5 + 0.1 * total_matches as f32).min(0.9);
                if switch_confidence < MIN_SWITCH_CONFIDENCE {
                    return ClassifyResult {
                        verdict: DomainVerdict {
                            primary: Some(current.to_string()),
                            secondary: Vec::new(),
                            confidence: switch_confidence,
                            reason: DomainReason::StickyDomain,
                            matched_tokens: vec!["context-override".to_string()],
                            is_context_override: true,
                        },
                        new_current_domain: None,
                    };
                }
            }
        }

        // Step 6: clear, confident detection — update current domain.
        match top_name {
            Some(name) => {
                let top = &scores[0];
                let secondary = secondary_domains(&scores);
                ClassifyResult {
                    verdict: DomainVerdict {
                        primary: Some(name.to_string()),
                        secondary,
                        confidence: CLEAR_DETECTION_CONFIDENCE,
                        reason: DomainReason::ClearDetection,
                        matched_tokens: top.matched.clone(),
                        is_context_override: false,
                    },
                    new_current_domain: Some(name.to_string()),
                }
            }
            None => ClassifyResult {
                verdict: DomainVerdict {
                    primary: None,
                    secondary: Vec::new(),
                    confidence: CLEAR_DETECTION_CONFIDENCE,
                    reason: DomainReason::ClearDetection,
                    matched_tokens: Vec::new(),
                    is_context_override: false,
                },
                new_current_domain: None,
            },
        }
    }

    fn find_explicit_indicator(&self, query_lower: &str) -> Option<&hrp_config::ExplicitIndicator> {
        self.config
            .explicit_indicators
            .iter()
            .find(|ind| query_lower.contains(&ind.token.to_lowercase()))
    }

    fn score_domains(&self, query_lower: &str) -> Vec<DomainScore<'_>> {
        let mut scores: Vec<DomainScore> = self
            .config
            .domains
            .iter()
            .filter_map(|domain| {
                let matched: Vec<String> = domain
                    .keywords
                    .iter()
                    .filter(|kw| query_lower.contains(kw.to_lowercase().as_str()))
                    .cloned()
                    .collect();
                if matched.is_empty() {
                    return None;
                }
                let score = matched.len() as f32 * domain.priority_boost;
                Some(DomainScore {
                    name: domain.name.as_str(),
                    score,
                    matched,
                })
            })
            .collect();

        // Stable sort keeps declaration order as the tie-break (§4.4).
        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scores
    }

    /// §4.4 step 4: stripped of filler words, is the query >= 70% ambiguous
    /// terms? The original implementation additionally treats a short list
    /// of purely contextual follow-up phrases ("updates", "this", "latest",
    /// ...) as an unconditional ambiguity trigger; carried forward here
    /// since the distilled spec is silent rather than prohibitive on it.
    fn is_ambiguous(&self, query_lower: &str) -> bool {
        let trimmed = query_lower.trim();
        let cfg = &self.config.sufficiency;

        for term in &cfg.contextual_terms {
            if trimmed.contains(term.as_str()) {
                return true;
            }
        }

        let query_words: Vec<&str> = trimmed
            .split_whitespace()
            .filter(|w| !cfg.filler_words.iter().any(|f| f == w))
            .collect();

        if query_words.is_empty() {
            return true;
        }

        let ambiguous_count = query_words
            .iter()
            .filter(|w| cfg.ambiguous_terms.iter().any(|term| w.contains(term.as_str())))
            .count();

        (ambiguous_count as f32 / query_words.len() as f32) > AMBIGUOUS_RATIO_THRESHOLD
    }
}

fn secondary_domains(scores: &[DomainScore]) -> Vec<String> {
    if scores.len() < 2 {
        return Vec::new();
    }
    let top_score = scores[0].score;
    scores[1..]
        .iter()
        .filter(|s| s.score >= top_score * 0.3)
        .map(|s| s.name.to_string())
        .collect()
}
