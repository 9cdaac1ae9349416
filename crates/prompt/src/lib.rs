//! Prompt Assembler (C9): renders the conversational turn's context
//! (persona, memory, overrides, domain, retrieved knowledge, web results)
//! into a single bounded prompt string, or — in clarification mode — a
//! smart redirect template keyed by query shape and domain.

pub mod builder;
pub mod character;
pub mod clarification;

pub use builder::{DomainContext, PromptBuilder, PromptInput};
pub use character::CharacterProfile;
pub use clarification::{build_clarification_prompt, classify_query_type, QueryType};
