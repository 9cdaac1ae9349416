//! Orchestrator (C11): the pipeline's single entry point. Drives an
//! admitted [`Query`] through domain classification, retrieval,
//! sufficiency/confidence assessment, conditional web search, prompt
//! assembly, and generation, within a total response-time budget, and is
//! total over its own failures — every call to [`Orchestrator::handle`]
//! returns exactly one [`Response`].

pub mod domain_state;
pub mod error;
pub mod orchestrator;
pub mod query;
pub mod response;

pub use domain_state::DomainSessionState;
pub use error::PipelineError;
pub use orchestrator::{Orchestrator, OrchestratorDeps, PipelineStats};
pub use query::Query;
pub use response::{Method, Response};
