//! Web Searcher (C7): the pipeline's external-knowledge fallback. Tries a
//! configured chain of [`SearchProvider`]s and returns the first usable
//! result set, or a synthetic search-suggestion when every provider comes
//! up empty.

pub mod provider;
pub mod providers;
pub mod searcher;
pub mod types;

pub use provider::SearchProvider;
pub use providers::{DuckDuckGoProvider, WikipediaProvider};
pub use searcher::WebSearcher;
pub use types::{WebResult, NO_SOURCE};
