use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hrp_assess::{ConfidenceAssessor, Recommendation, SufficiencyAssessor};
use hrp_config::PipelineConfig;
use hrp_domain::DomainClassifier;
use hrp_limits::{BreakerRegistry, RateLimiter};
use hrp_llm::{GenerationParams, LlmClient, QueryProfile};
use hrp_memory::schema::Role;
use hrp_memory::session::SessionMemory;
use hrp_prompt::{
    build_clarification_prompt, classify_query_type, CharacterProfile, DomainContext, PromptBuilder, PromptInput,
};
use hrp_retrieval::{Chunk, Retriever, VectorStore};
use hrp_websearch::{WebResult, WebSearcher};

use crate::domain_state::DomainSessionState;
use crate::error::PipelineError;
use crate::query::Query;
use crate::response::{Method, Response};

const WEB_SERVICE: &str = "web_search";
const LLM_SERVICE: &str = "llm";
const MIN_CONFIDENCE_FOR_CLARIFICATION: f32 = 0.3;
const CANONICAL_SEARCH_URL: &str = "https://duckduckgo.com/?q=";

const FALLBACK_TIMEOUT: &str = "That took longer than expected. Could you try asking again?";
const FALLBACK_ULTIMATE: &str = "Sorry, something went wrong on my end. Please try again in a moment.";
const FALLBACK_CIRCUIT_OPEN: &str = "I'm having trouble reaching my language model right now. Please try again in a few minutes.";

/// Orchestrator (C11): drives every admitted Query through C1-C10 within a
/// total response-time budget, and is total over its own failures: exactly
/// one [`Response`] comes back per call to [`Orchestrator::handle`].
pub struct Orchestrator {
    config: PipelineConfig,
    character: CharacterProfile,
    rate_limiter: RateLimiter,
    breakers: Arc<BreakerRegistry>,
    memory: SessionMemory,
    domain_state: DomainSessionState,
    retriever: Retriever,
    sufficiency: SufficiencyAssessor,
    confidence: ConfidenceAssessor,
    web_searcher: WebSearcher,
    prompt_builder: PromptBuilder,
    llm: LlmClient,
    request_counter: AtomicU64,
}

pub struct OrchestratorDeps {
    pub store: Arc<dyn VectorStore>,
    pub web_providers: Vec<Arc<dyn hrp_websearch::SearchProvider>>,
    pub llm_provider: Arc<dyn hrp_llm::LlmProvider>,
    pub character: CharacterProfile,
}

/// Read-only diagnostic snapshot (§10.6), not part of the request/response
/// contract. Mirrors the original bot's `get_domain_stats`.
#[derive(Debug)]
pub struct PipelineStats {
    pub domain_counts: std::collections::HashMap<String, usize>,
    pub rag_breaker: hrp_limits::BreakerSnapshot,
    pub web_breaker: hrp_limits::BreakerSnapshot,
    pub llm_breaker: hrp_limits::BreakerSnapshot,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, memory: SessionMemory, deps: OrchestratorDeps) -> Self {
        let breakers = Arc::new(BreakerRegistry::new(config.breaker.clone()));
        let retriever = Retriever::new(deps.store, breakers.clone());
        let sufficiency = SufficiencyAssessor::new(&config.sufficiency);
        let confidence = ConfidenceAssessor::new();
        let web_searcher = WebSearcher::new(deps.web_providers, breakers.clone(), &config.web_search, CANONICAL_SEARCH_URL);
        let prompt_builder = PromptBuilder::new(config.prompt.max_chars);
        let llm = LlmClient::new(deps.llm_provider, breakers.clone(), &config.llm);
        let rate_limiter = RateLimiter::new(config.rate_limit.clone());

        Self {
            config,
            character: deps.character,
            rate_limiter,
            breakers,
            memory,
            domain_state: DomainSessionState::new(),
            retriever,
            sufficiency,
            confidence,
            web_searcher,
            prompt_builder,
            llm,
            request_counter: AtomicU64::new(0),
        }
    }

    pub fn next_request_id(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Read-only diagnostic snapshot; never consulted by `handle` itself.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            domain_counts: self.domain_state.domain_counts(),
            rag_breaker: self.breakers.snapshot("rag_search"),
            web_breaker: self.breakers.snapshot(WEB_SERVICE),
            llm_breaker: self.breakers.snapshot("llm"),
        }
    }

    /// The pipeline's one total entry point (§4.11, §7's propagation
    /// policy). Never returns an error; every admitted Query yields exactly
    /// one Response, even if every downstream component fails.
    pub async fn handle(&self, query: Query) -> Response {
        let user_id = query.user_id_hash();
        let started = Instant::now();
        let total_budget = Duration::from_secs(self.config.orchestrator.max_response_time_secs);
        let min_floor = Duration::from_secs(self.config.orchestrator.min_remaining_budget_secs);

        tracing::info!(request_id = query.request_id, user_id, "admitting query");

        // 1. Admission
        if !self.rate_limiter.admit(user_id, query.arrived_at) {
            tracing::debug!(request_id = query.request_id, user_id, "rate limited");
            return Response::new("", Method::BasicLlm);
        }

        let remaining = |started: Instant| total_budget.saturating_sub(started.elapsed());

        if remaining(started) < min_floor {
            return Response::timeout_fallback(FALLBACK_TIMEOUT);
        }

        // 2. Context load
        let conversation_block = self.memory.context_for(user_id, None).await.unwrap_or_default();

        // 3. Memory write (user)
        if let Err(err) = self.memory.append(user_id, Role::User, query.text.clone()).await {
            tracing::warn!(request_id = query.request_id, error = %err, "failed to persist user turn");
        }

        // 4. Domain classification
        let current_domain = self.domain_state.get(user_id);
        let classifier = DomainClassifier::new(&self.config);
        let classify_result = classifier.classify(&query.text, current_domain.as_deref());
        if let Some(new_domain) = classify_result.new_current_domain.clone() {
            self.domain_state.set(user_id, new_domain);
        }
        let verdict = classify_result.verdict;
        let domain_config = verdict
            .primary
            .as_ref()
            .and_then(|name| self.config.domains.iter().find(|d| &d.name == name));

        if remaining(started) < min_floor {
            return Response::timeout_fallback(FALLBACK_TIMEOUT);
        }

        // 5. Retrieval (the retriever itself checks the breaker and degrades
        // to an empty list rather than erroring; see hrp-retrieval).
        let rag_deadline = stage_deadline(remaining(started), Duration::from_secs(5));
        let chunks = self
            .retriever
            .retrieve(&query.text, domain_config, self.config.retrieval.k, rag_deadline)
            .await;

        let (overrides, kb_chunks): (Vec<Chunk>, Vec<Chunk>) =
            chunks.into_iter().partition(|c| c.metadata.is_override);

        // 6. Sufficiency
        let rag_assessment = self.sufficiency.assess(&query.text, &kb_chunks);

        if remaining(started) < min_floor {
            return Response::timeout_fallback(FALLBACK_TIMEOUT);
        }

        // 7. Conditional web search
        let should_search_web = matches!(
            rag_assessment.recommendation,
            Recommendation::WebSearch | Recommendation::UseRagWithWebFallback
        );

        let (web_results, web_assessment) = if should_search_web && self.breakers.allow(WEB_SERVICE) {
            let results = self.web_searcher.search(&query.text, 3).await;
            let assessment = self.confidence.assess(&results, &query.text);
            (results, Some(assessment))
        } else {
            (Vec::new(), None)
        };

        // 8. Clarification check
        let both_low_confidence = web_assessment
            .as_ref()
            .map(|w| rag_assessment.confidence < MIN_CONFIDENCE_FOR_CLARIFICATION && w.confidence < MIN_CONFIDENCE_FOR_CLARIFICATION)
            .unwrap_or(false);
        let both_recommend_clarify = rag_assessment.recommendation == Recommendation::AskForClarification
            && web_assessment
                .as_ref()
                .map(|w| w.recommendation == Recommendation::AskForClarification)
                .unwrap_or(false);
        let clarification_mode = both_low_confidence || both_recommend_clarify;

        if remaining(started) < min_floor {
            return Response::timeout_fallback(FALLBACK_TIMEOUT);
        }

        // 9. Prompt assembly
        let persona = self.character.persona_label().to_string();
        let prompt = if clarification_mode {
            let domain_pair = domain_config.map(|d| (d.name.as_str(), d.emoji.as_str()));
            build_clarification_prompt(&persona, &query.text, domain_pair)
        } else {
            let domain_context = verdict.primary.as_ref().map(|name| DomainContext {
                name: name.clone(),
                matched_tokens: verdict.matched_tokens.clone(),
                priority_boost: domain_config.map(|d| d.priority_boost).unwrap_or(1.0),
                emoji: domain_config.map(|d| d.emoji.clone()).unwrap_or_default(),
            });
            let input = PromptInput {
                query: &query.text,
                character: Some(&self.character),
                conversation_block: &conversation_block,
                overrides: &overrides,
                domain: domain_context.as_ref(),
                kb_chunks: &kb_chunks,
                web_results: &web_results,
                now: chrono::Local::now(),
                is_statistical: rag_assessment.is_statistical,
            };
            self.prompt_builder.build(&input)
        };

        // 10. LLM call. The breaker is checked here, before attempting the
        // provider, so an open breaker is distinguishable from any other LLM
        // failure (S4: "subsequent requests return circuit-open fallback
        // without attempting the LLM provider"); `LlmClient::generate` also
        // checks it internally as defense-in-depth for callers that invoke
        // it directly.
        if !self.breakers.allow(LLM_SERVICE) {
            let err = PipelineError::BreakerOpen(LLM_SERVICE);
            tracing::warn!(request_id = query.request_id, error = %err, "llm breaker open, skipping provider call");
            return Response::circuit_open_fallback(FALLBACK_CIRCUIT_OPEN);
        }

        let profile = if query.text.split_whitespace().count() <= 6 {
            QueryProfile::SmallTalk
        } else if matches!(
            rag_assessment.recommendation,
            Recommendation::UseRag | Recommendation::UseRagWithWebFallback
        ) {
            QueryProfile::Analytical
        } else {
            QueryProfile::Default
        };
        let params = GenerationParams::for_profile(profile, &self.config.llm, false);

        let llm_deadline = stage_deadline(remaining(started), Duration::from_secs(self.config.llm.timeout_secs));
        let generation = tokio::time::timeout(llm_deadline, self.llm.generate(&prompt, params)).await;

        let content = match generation {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                tracing::warn!(request_id = query.request_id, error = %err, "llm call failed");
                return Response::ultimate_fallback(FALLBACK_ULTIMATE, err.to_string());
            }
            Err(_) => {
                tracing::warn!(request_id = query.request_id, "llm call exceeded remaining budget");
                return Response::timeout_fallback(FALLBACK_TIMEOUT);
            }
        };

        // 11. Post-process
        let sources = real_sources(&web_results);
        let content = paragraph_format(&content);

        // 12. Memory write (assistant)
        if !content.is_empty() {
            if let Err(err) = self.memory.append(user_id, Role::Assistant, content.clone()).await {
                tracing::warn!(request_id = query.request_id, error = %err, "failed to persist assistant turn");
            }
        }

        // 13. Return
        let method = choose_method(clarification_mode, &overrides, verdict.secondary.len(), &web_results, &kb_chunks);
        tracing::info!(
            request_id = query.request_id,
            user_id,
            latency_ms = started.elapsed().as_millis() as u64,
            method = ?method,
            "turn complete"
        );

        Response::new(content, method).with_sources(sources)
    }
}

fn stage_deadline(remaining_total: Duration, stage_default: Duration) -> Duration {
    remaining_total.min(stage_default)
}

fn real_sources(results: &[WebResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.is_suggestion && r.url.starts_with("http"))
        .map(|r| r.url.clone())
        .collect()
}

/// Groups sentences into paragraphs of 2-3 sentences once the running
/// length exceeds ~120 chars (§4.11 step 11).
fn paragraph_format(text: &str) -> String {
    let sentences: Vec<&str> = text.split_inclusive(['.', '!', '?']).map(str::trim).filter(|s| !s.is_empty()).collect();
    if sentences.len() <= 3 {
        return text.trim().to_string();
    }

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for sentence in sentences {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
        count += 1;

        if count >= 2 && current.len() > 120 || count >= 3 {
            paragraphs.push(current.clone());
            current.clear();
            count = 0;
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs.join("\n\n")
}

fn choose_method(
    clarification_mode: bool,
    overrides: &[Chunk],
    secondary_domain_count: usize,
    web_results: &[WebResult],
    kb_chunks: &[Chunk],
) -> Method {
    if clarification_mode {
        return Method::SmartClarification;
    }
    if !overrides.is_empty() {
        return Method::MultiDomainRag;
    }
    if secondary_domain_count > 0 {
        return Method::MultiDomainRag;
    }
    match (kb_chunks.is_empty(), web_results.is_empty()) {
        (false, false) => Method::HybridRagWeb,
        (false, true) => Method::MultiDomainRag,
        (true, false) => Method::WebOnly,
        (true, true) => Method::BasicLlm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hrp_config::SessionConfig;
    use hrp_retrieval::{ChunkMetadata, SourceType};

    struct EmptyStore;

    #[async_trait]
    impl VectorStore for EmptyStore {
        async fn search(&self, _query_text: &str, _n: usize) -> anyhow::Result<Vec<Chunk>> {
            Ok(Vec::new())
        }
    }

    struct FixedStore(Vec<Chunk>);

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn search(&self, _query_text: &str, _n: usize) -> anyhow::Result<Vec<Chunk>> {
            Ok(self.0.clone())
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl hrp_websearch::SearchProvider for EmptyProvider {
        fn name(&self) -> &str {
            "empty"
        }
        async fn search(&self, _query: &str, _n: usize) -> anyhow::Result<Vec<WebResult>> {
            Ok(Vec::new())
        }
    }

    struct FixedLlm(&'static str);

    #[async_trait]
    impl hrp_llm::LlmProvider for FixedLlm {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(&self, _prompt: &str, _params: &GenerationParams) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn chunk(source: &str, content: &str) -> Chunk {
        Chunk {
            id: source.to_string(),
            content: content.to_string(),
            distance: 0.1,
            metadata: ChunkMetadata {
                source: source.to_string(),
                source_type: SourceType::File,
                is_override: false,
                priority: 0,
                timestamp: chrono::Utc::now(),
                domain_tag: None,
            },
        }
    }

    async fn build_orchestrator(store: Arc<dyn VectorStore>, llm_text: &'static str) -> (Orchestrator, tempfile::TempDir) {
        let config = PipelineConfig {
            rate_limit: hrp_config::RateLimitConfig { min_interval_secs: 0.0 },
            session: SessionConfig::default(),
            ..PipelineConfig::default()
        };
        let (memory, dir) = SessionMemory::open_temp(&config.session).unwrap();
        let deps = OrchestratorDeps {
            store,
            web_providers: vec![Arc::new(EmptyProvider)],
            llm_provider: Arc::new(FixedLlm(llm_text)),
            character: CharacterProfile { name: "Tester".into(), ..Default::default() },
        };
        (Orchestrator::new(config, memory, deps), dir)
    }

    #[tokio::test]
    async fn basic_llm_response_with_no_context() {
        let (orchestrator, _dir) = build_orchestrator(Arc::new(EmptyStore), "Hi, how can I help?").await;
        let query = Query::new("hello there", "user-1", orchestrator.next_request_id());
        let response = orchestrator.handle(query).await;
        assert!(!response.content.is_empty());
        assert!(!response.timed_out);
    }

    #[tokio::test]
    async fn override_chunks_produce_multi_domain_rag_method() {
        let overrides = vec![Chunk {
            metadata: ChunkMetadata { is_override: true, source_type: SourceType::Override, ..chunk("ov", "never mention X").metadata },
            ..chunk("ov", "never mention X")
        }];
        let (orchestrator, _dir) = build_orchestrator(Arc::new(FixedStore(overrides)), "Understood.").await;
        let query = Query::new("what's the rule here", "user-2", orchestrator.next_request_id());
        let response = orchestrator.handle(query).await;
        assert_eq!(response.method, Method::MultiDomainRag);
    }

    #[tokio::test]
    async fn open_llm_breaker_returns_circuit_open_fallback_without_calling_provider() {
        let (orchestrator, _dir) = build_orchestrator(Arc::new(EmptyStore), "should never be returned").await;
        for _ in 0..orchestrator.config.breaker.threshold {
            orchestrator.breakers.record_failure(LLM_SERVICE);
        }
        let query = Query::new("hello there", "user-4", orchestrator.next_request_id());
        let response = orchestrator.handle(query).await;
        assert_eq!(response.method, Method::CircuitOpenFallback);
        assert_ne!(response.content, "should never be returned");
    }

    #[tokio::test]
    async fn rate_limited_request_returns_empty_response_without_panicking() {
        let config = PipelineConfig { rate_limit: hrp_config::RateLimitConfig { min_interval_secs: 60.0 }, ..PipelineConfig::default() };
        let (memory, _dir) = SessionMemory::open_temp(&config.session).unwrap();
        let deps = OrchestratorDeps {
            store: Arc::new(EmptyStore),
            web_providers: vec![Arc::new(EmptyProvider)],
            llm_provider: Arc::new(FixedLlm("hi")),
            character: CharacterProfile::default(),
        };
        let orchestrator = Orchestrator::new(config, memory, deps);
        let q1 = Query::new("first", "user-3", orchestrator.next_request_id());
        let q2 = Query::new("second", "user-3", orchestrator.next_request_id());
        let _ = orchestrator.handle(q1).await;
        let response = orchestrator.handle(q2).await;
        assert!(response.content.is_empty());
    }

    #[test]
    fn paragraph_format_splits_long_output() {
        let text = "One sentence here that is fairly long to push past threshold. Two sentence here that is also quite long. Three sentence follows after that. Four sentence wraps things up nicely.";
        let formatted = paragraph_format(text);
        assert!(formatted.contains("\n\n"));
    }

    #[test]
    fn short_output_is_not_split_into_paragraphs() {
        let text = "Short answer.";
        assert_eq!(paragraph_format(text), "Short answer.");
    }
}
