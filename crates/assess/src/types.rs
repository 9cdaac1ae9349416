use serde::{Deserialize, Serialize};

/// Routing recommendation emitted by C6 (Sufficiency Assessor) and C8
/// (Confidence Assessor). The two components' decision tables (§4.6, §4.8)
/// name overlapping but not identical variant sets; both live on one enum
/// so `Assessment` stays a single type per §3, and the Orchestrator doesn't
/// need to know which assessor produced a given verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    UseRag,
    WebSearch,
    UseRagWithWebFallback,
    AskForClarification,
    BasicResponse,
    UseWeb,
    UseWebWithCaution,
}

/// `{confidence, recommendation, reason}` per §3, plus `is_statistical` —
/// whether the query that produced this assessment matched C6's
/// statistical-query patterns (§4.6). The Prompt Assembler (C9) needs this
/// to pick instructions tailored to (statistical vs. general) × (evidence
/// shape) per §4.9 step 9; C8 (Confidence Assessor) never classifies query
/// type itself and always leaves it `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub confidence: f32,
    pub recommendation: Recommendation,
    pub reason: String,
    pub is_statistical: bool,
}

impl Assessment {
    pub fn new(confidence: f32, recommendation: Recommendation, reason: impl Into<String>) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            recommendation,
            reason: reason.into(),
            is_statistical: false,
        }
    }

    /// Variant of [`Self::new`] that also records the statistical-query flag;
    /// used by C6, the only assessor that computes it.
    pub fn new_with_statistical(confidence: f32, recommendation: Recommendation, reason: impl Into<String>, is_statistical: bool) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            recommendation,
            reason: reason.into(),
            is_statistical,
        }
    }

    /// §7 `AssessmentValidation`: a malformed assessment (confidence out of
    /// range) is coerced in `new`; this constructs the defensive fallback
    /// used when an assessor itself cannot produce a verdict at all.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            confidence: 0.0,
            recommendation: Recommendation::BasicResponse,
            reason: reason.into(),
            is_statistical: false,
        }
    }
}
