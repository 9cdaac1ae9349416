//! LLM Client (C10): single-shot text completion behind a breaker, a hard
//! timeout, retry-with-backoff, and post-generation length limiting.

pub mod client;
pub mod length;
pub mod params;
pub mod provider;
pub mod providers;

pub use client::LlmClient;
pub use params::{GenerationParams, QueryProfile};
pub use provider::LlmProvider;
pub use providers::{OllamaProvider, OpenRouterProvider};
