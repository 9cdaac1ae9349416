use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub threshold: u32,
    pub cooldown_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            cooldown_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub min_interval_secs: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_turns: usize,
    pub context_turns: usize,
    pub reap_after_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: 50,
            context_turns: 10,
            reap_after_days: 7,
        }
    }
}

/// One declaratively-configured knowledge domain.
///
/// `keywords` drive C4's raw scoring pass; `override_prefixes` mark which
/// override chunks belong to this domain so C5/C9 can gate them correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub name: String,
    pub keywords: Vec<String>,
    pub source_type_tags: Vec<String>,
    pub override_prefixes: Vec<String>,
    pub priority_boost: f32,
    pub emoji: String,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            keywords: Vec::new(),
            source_type_tags: Vec::new(),
            override_prefixes: Vec::new(),
            priority_boost: 1.0,
            emoji: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub k: usize,
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 5,
            similarity_threshold: 0.8,
        }
    }
}

/// Configuration-data for C6, per the spec's explicit call-out that the
/// statistical-pattern and ambiguous-term lists are not part of the core
/// contract. Defaults below are sourced from the original implementation's
/// own configuration; operators are expected to override them verbatim for
/// their domain set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SufficiencyConfig {
    pub statistical_patterns: Vec<String>,
    pub career_indicators: Vec<String>,
    pub ambiguous_terms: Vec<String>,
    pub contextual_terms: Vec<String>,
    pub filler_words: Vec<String>,
}

impl Default for SufficiencyConfig {
    fn default() -> Self {
        Self {
            statistical_patterns: vec![
                r"\bhow many\b".into(),
                r"\baverage\b".into(),
                r"\bspecific\b|\bexact\b|\bprecise\b|\bdetailed\b".into(),
                r"\bresults?\b|\bstandings?\b|\bschedule\b".into(),
                r"\bcompare\b|\bcomparison\b|\bversus\b|\bvs\.?\b".into(),
                r"\brecommend\b|\bpredict\b|\bwho will\b".into(),
                r"\bstats?\b|\bstatistics?\b".into(),
            ],
            career_indicators: vec![
                "career".into(),
                "total".into(),
                "all-time".into(),
                "all time".into(),
                "lifetime".into(),
            ],
            ambiguous_terms: vec![
                "stats".into(),
                "performance".into(),
                "results".into(),
                "standings".into(),
                "scores".into(),
                "rankings".into(),
                "season".into(),
                "games".into(),
                "matches".into(),
                "data".into(),
                "numbers".into(),
                "info".into(),
                "information".into(),
            ],
            contextual_terms: vec![
                "updates".into(),
                "update".into(),
                "this".into(),
                "that".into(),
                "it".into(),
                "them".into(),
                "they".into(),
                "latest".into(),
                "recent".into(),
                "new".into(),
                "what happened".into(),
                "how about".into(),
                "tell me more".into(),
            ],
            filler_words: vec![
                "tell".into(),
                "me".into(),
                "show".into(),
                "give".into(),
                "about".into(),
                "the".into(),
                "some".into(),
                "any".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub timeout_secs: u64,
    pub provider_timeout_secs: u64,
    pub max_retries: u32,
    pub providers: Vec<String>,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            provider_timeout_secs: 10,
            max_retries: 2,
            providers: vec!["wikipedia".to_string(), "duckduckgo".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub small_talk_max_tokens: u32,
    pub small_talk_temperature: f32,
    pub analytical_max_tokens: u32,
    pub analytical_temperature: f32,
    pub default_max_tokens: u32,
    pub default_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            small_talk_max_tokens: 150,
            small_talk_temperature: 0.9,
            analytical_max_tokens: 600,
            analytical_temperature: 0.4,
            default_max_tokens: 400,
            default_temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub max_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { max_chars: 16_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_response_time_secs: u64,
    pub min_remaining_budget_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_response_time_secs: 45,
            min_remaining_budget_secs: 2,
        }
    }
}

/// A high-signal token that short-circuits domain classification (§4.4 step 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplicitIndicator {
    pub token: String,
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub breaker: BreakerConfig,
    pub rate_limit: RateLimitConfig,
    pub session: SessionConfig,
    pub domains: Vec<DomainConfig>,
    pub explicit_indicators: Vec<ExplicitIndicator>,
    pub retrieval: RetrievalConfig,
    pub sufficiency: SufficiencyConfig,
    pub web_search: WebSearchConfig,
    pub llm: LlmConfig,
    pub prompt: PromptConfig,
    pub orchestrator: OrchestratorConfig,
}

impl PipelineConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    /// Index of a domain by declaration order — used to break scoring ties
    /// (§4.4: ties are broken by the order of domain declaration).
    pub fn domain_index(&self, name: &str) -> Option<usize> {
        self.domains.iter().position(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = PipelineConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: PipelineConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.breaker.threshold, config.breaker.threshold);
        assert_eq!(parsed.llm.timeout_secs, config.llm.timeout_secs);
    }

    #[test]
    fn load_from_missing_path_falls_back_to_defaults() {
        let config = PipelineConfig::load_from("/nonexistent/path/does/not/exist.toml").unwrap();
        assert_eq!(config.orchestrator.max_response_time_secs, 45);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let mut config = PipelineConfig::default();
        config.rate_limit.min_interval_secs = 5.0;
        config.save_to(&path).unwrap();

        let loaded = PipelineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.rate_limit.min_interval_secs, 5.0);
    }

    #[test]
    fn domain_index_reflects_declaration_order() {
        let mut config = PipelineConfig::default();
        config.domains.push(DomainConfig {
            name: "nba".into(),
            ..Default::default()
        });
        config.domains.push(DomainConfig {
            name: "f1".into(),
            ..Default::default()
        });
        assert_eq!(config.domain_index("nba"), Some(0));
        assert_eq!(config.domain_index("f1"), Some(1));
        assert_eq!(config.domain_index("nhl"), None);
    }
}
