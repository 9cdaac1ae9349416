//! Sufficiency Assessor (C6) and Confidence Assessor (C8): the pipeline's
//! pure decision tables. Both score an upstream component's output against
//! query intent and emit an [`Assessment`] — deterministic, side-effect
//! free, and the easiest part of the pipeline to test exhaustively.

pub mod confidence;
pub mod sufficiency;
pub mod types;

pub use confidence::ConfidenceAssessor;
pub use sufficiency::SufficiencyAssessor;
pub use types::{Assessment, Recommendation};
