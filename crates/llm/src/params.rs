use hrp_config::LlmConfig;

/// Generation parameters for a single completion call (§4.10).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Coarse shape of the turn, used to pick a token/temperature preset before
/// the LLM is ever called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryProfile {
    SmallTalk,
    Analytical,
    Default,
}

impl GenerationParams {
    pub fn for_profile(profile: QueryProfile, config: &LlmConfig, voice: bool) -> Self {
        let (max_tokens, temperature) = match profile {
            QueryProfile::SmallTalk => (config.small_talk_max_tokens, config.small_talk_temperature),
            QueryProfile::Analytical => (config.analytical_max_tokens, config.analytical_temperature),
            QueryProfile::Default => (config.default_max_tokens, config.default_temperature),
        };
        let max_tokens = if voice { max_tokens / 2 } else { max_tokens };
        Self { max_tokens, temperature }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
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

    #[test]
    fn small_talk_preset() {
        let params = GenerationParams::for_profile(QueryProfile::SmallTalk, &config(), false);
        assert_eq!(params.max_tokens, 150);
        assert_eq!(params.temperature, 0.9);
    }

    #[test]
    fn voice_halves_max_tokens() {
        let params = GenerationParams::for_profile(QueryProfile::Analytical, &config(), true);
        assert_eq!(params.max_tokens, 300);
        assert_eq!(params.temperature, 0.4);
    }
}
