use serde::{Deserialize, Serialize};

/// Pipeline path actually taken for a turn (§3 `Response.method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    MultiDomainRag,
    HybridRagWeb,
    WebOnly,
    BasicLlm,
    SmartClarification,
    TimeoutFallback,
    CircuitOpenFallback,
    UltimateFallback,
}

impl Method {
    /// Short glyph prefixed to user-facing content (§4.11 step 13).
    pub fn prefix_tag(self) -> &'static str {
        match self {
            Method::MultiDomainRag => "\u{26a1}",
            Method::HybridRagWeb => "\u{1f310}",
            Method::WebOnly => "\u{1f310}",
            Method::BasicLlm => "\u{1f916}",
            Method::SmartClarification => "\u{2753}",
            Method::TimeoutFallback => "\u{23f1}",
            Method::CircuitOpenFallback => "\u{26a1}",
            Method::UltimateFallback => "\u{1f916}",
        }
    }
}

/// The pipeline's one and only output type (§3 `Response`). `handle()` is
/// total: every admitted Query yields exactly one of these, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub prefix_tag: String,
    pub sources: Vec<String>,
    pub method: Method,
    pub error: Option<String>,
    pub timed_out: bool,
}

impl Response {
    pub fn new(content: impl Into<String>, method: Method) -> Self {
        Self {
            content: content.into(),
            prefix_tag: method.prefix_tag().to_string(),
            sources: Vec::new(),
            method,
            error: None,
            timed_out: false,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn timeout_fallback(message: impl Into<String>) -> Self {
        let mut response = Self::new(message, Method::TimeoutFallback);
        response.timed_out = true;
        response
    }

    pub fn circuit_open_fallback(message: impl Into<String>) -> Self {
        Self::new(message, Method::CircuitOpenFallback)
    }

    pub fn ultimate_fallback(message: impl Into<String>, error: impl Into<String>) -> Self {
        let mut response = Self::new(message, Method::UltimateFallback);
        response.error = Some(error.into());
        response
    }
}
