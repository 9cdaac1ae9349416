use thiserror::Error;

/// Conceptual error kinds from §7, given concrete variants. Every component
/// beneath the Orchestrator returns `anyhow::Result`/`Result<_, PipelineError>`;
/// `handle()` is the single total boundary that matches on these instead of
/// re-deriving them from string content.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transient upstream failure: {0}")]
    Transient(String),

    #[error("breaker open for service {0}")]
    BreakerOpen(&'static str),

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}
