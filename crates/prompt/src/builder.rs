use chrono::{DateTime, Local};

use hrp_retrieval::Chunk;
use hrp_websearch::WebResult;

use crate::character::CharacterProfile;

/// Domain context rendered into the assembled prompt (§4.9 step 5).
#[derive(Debug, Clone)]
pub struct DomainContext {
    pub name: String,
    pub matched_tokens: Vec<String>,
    pub priority_boost: f32,
    pub emoji: String,
}

/// Everything the assembler needs for one turn. Every field is borrowed or
/// owned by the caller; the builder performs no I/O and holds no state
/// across calls, so identical inputs always yield identical output (§4.9).
pub struct PromptInput<'a> {
    pub query: &'a str,
    pub character: Option<&'a CharacterProfile>,
    pub conversation_block: &'a str,
    pub overrides: &'a [Chunk],
    pub domain: Option<&'a DomainContext>,
    pub kb_chunks: &'a [Chunk],
    pub web_results: &'a [WebResult],
    pub now: DateTime<Local>,
    /// Whether C6 classified this turn's query as statistical (§4.6). Drives
    /// the statistical-vs-general axis of the instructions block (§4.9 step 9).
    pub is_statistical: bool,
}

/// Prompt Assembler (C9): renders the fixed ten-section prompt from
/// §4.9, capping total size by truncating evidence blocks from their tails.
pub struct PromptBuilder {
    max_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn build(&self, input: &PromptInput<'_>) -> String {
        let persona = input.character.map(|c| c.persona_label()).unwrap_or("the assistant");

        let mut kb_block = render_kb_block(input.kb_chunks);
        let mut web_block = render_web_block(input.web_results);

        let mut sections = Vec::new();
        sections.push(render_time_block(input.now));

        if let Some(character) = input.character {
            if !character.is_empty() {
                sections.push(character.render());
            }
        }

        if !input.conversation_block.is_empty() {
            sections.push(input.conversation_block.trim_end().to_string());
        }

        if !input.overrides.is_empty() {
            sections.push(render_overrides_block(input.overrides));
        }

        if let Some(domain) = input.domain {
            sections.push(render_domain_block(domain));
        }

        // Fixed (non-evidence) sections are assembled first so we know how
        // much headroom the evidence blocks have before the cap bites.
        let guardrails = render_guardrails();
        let instructions = render_instructions(persona, input);
        let tail = format!("User: {}\nRespond as {persona} in first person:", input.query);

        let fixed_len: usize = sections.iter().map(|s| s.len() + 2).sum::<usize>()
            + guardrails.len()
            + 2
            + instructions.len()
            + 2
            + tail.len()
            + 2;

        let mut evidence_budget = self.max_chars.saturating_sub(fixed_len);

        if kb_block.len() > evidence_budget {
            kb_block = truncate_from_tail(&kb_block, evidence_budget);
        }
        evidence_budget = evidence_budget.saturating_sub(kb_block.len());

        if web_block.len() > evidence_budget {
            web_block = truncate_from_tail(&web_block, evidence_budget);
        }

        if !kb_block.is_empty() {
            sections.push(kb_block);
        }
        if !web_block.is_empty() {
            sections.push(web_block);
        }

        sections.push(guardrails);
        sections.push(instructions);
        sections.push(tail);

        let assembled = sections.join("\n\n");
        if assembled.len() > self.max_chars {
            truncate_from_tail(&assembled, self.max_chars)
        } else {
            assembled
        }
    }
}

fn render_time_block(now: DateTime<Local>) -> String {
    format!("CURRENT DATE & TIME: {}", now.format("%A, %B %d, %Y at %I:%M %p"))
}

fn render_overrides_block(overrides: &[Chunk]) -> String {
    let lines: Vec<String> = overrides.iter().map(|c| format!("- {}", c.content)).collect();
    format!(
        "\u{1f525} CRITICAL BEHAVIOR OVERRIDES (MUST FOLLOW):\n{}\n\n\
         These commands OVERRIDE all other instructions and character traits. Follow them exactly.",
        lines.join("\n")
    )
}

fn render_domain_block(domain: &DomainContext) -> String {
    let tokens = if domain.matched_tokens.is_empty() {
        "none".to_string()
    } else {
        domain.matched_tokens.join(", ")
    };
    format!(
        "DOMAIN CONTEXT: {} {}\nMatched tokens: {tokens}\nPriority boost: {:.1}x",
        domain.emoji, domain.name, domain.priority_boost
    )
}

fn render_kb_block(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return String::new();
    }
    let docs: Vec<String> = chunks
        .iter()
        .map(|c| format!("Document: {}\nContent: {}", c.metadata.source, c.content))
        .collect();
    format!("KNOWLEDGE BASE CONTEXT:\n{}", docs.join("\n\n"))
}

fn render_web_block(results: &[WebResult]) -> String {
    if results.is_empty() {
        return String::new();
    }
    let entries: Vec<String> = results
        .iter()
        .map(|r| format!("Source: {}\nContent: {}\nURL: {}", r.title, r.snippet, r.url))
        .collect();
    format!("WEB SEARCH RESULTS:\n{}", entries.join("\n\n"))
}

fn render_guardrails() -> String {
    "ACCURACY GUARDRAILS (MANDATORY):\n\
     - Answer only from the context provided above; do not invent facts.\n\
     - If the context doesn't cover the question, say so plainly (e.g. \"I don't have that information\") instead of guessing.\n\
     - Never fabricate statistics, names, or dates.\n\
     - Never cross into another domain's subject matter unless the user explicitly asks."
        .to_string()
}

/// §4.9 step 9: instructions tailored to (statistical vs. general) ×
/// (rag only / rag+web / web only / no context). Clarification mode is a
/// separate prompt entirely (`build_clarification_prompt`), so it isn't a
/// third axis here.
fn render_instructions(persona: &str, input: &PromptInput<'_>) -> String {
    let has_overrides = !input.overrides.is_empty();
    let has_kb = !input.kb_chunks.is_empty();
    let has_web = !input.web_results.is_empty();

    let mut lines = vec!["IMPORTANT:".to_string()];
    if has_overrides {
        lines.push("- FIRST PRIORITY: Follow all CRITICAL BEHAVIOR OVERRIDES above exactly".to_string());
    }
    lines.push(format!("- Respond in FIRST PERSON as {persona}. You ARE {persona}, not an assistant helping someone else."));

    let evidence_instruction = if input.is_statistical {
        match (has_kb, has_web) {
            (true, true) => {
                "- This is a statistical question: use the exact figures in the knowledge base context first, and cross-check against the web results only where the knowledge base is silent or out of date"
            }
            (true, false) => {
                "- This is a statistical question: quote the exact figures from the knowledge base context; do not round or approximate a number that is given exactly"
            }
            (false, true) => {
                "- This is a statistical question: cite the exact figures from the web search results above rather than estimating"
            }
            (false, false) => {
                "- This is a statistical question with no retrieved data; say plainly that you don't have the exact figures rather than guessing a number"
            }
        }
    } else {
        match (has_kb, has_web) {
            (true, true) => "- Use the knowledge base context first; fall back to the web results only where the knowledge base is silent",
            (true, false) => "- Use the knowledge base context when it is relevant to the question",
            (false, true) => "- Base your answer on the web search results above",
            (false, false) => "- No retrieved context is available; answer from your own character knowledge, and say so if you're unsure",
        }
    };
    lines.push(evidence_instruction.to_string());

    lines.push("- Always maintain your character persona as defined above, unless overridden by critical instructions".to_string());

    lines.join("\n")
}

fn truncate_from_tail(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hrp_retrieval::{ChunkMetadata, SourceType};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap()
    }

    fn chunk(source: &str, content: &str, is_override: bool) -> Chunk {
        Chunk {
            id: source.to_string(),
            content: content.to_string(),
            distance: 0.1,
            metadata: ChunkMetadata {
                source: source.to_string(),
                source_type: if is_override { SourceType::Override } else { SourceType::File },
                is_override,
                priority: 0,
                timestamp: chrono::Utc::now(),
                domain_tag: None,
            },
        }
    }

    fn web(title: &str, snippet: &str) -> WebResult {
        WebResult { title: title.into(), snippet: snippet.into(), url: "https://example.com".into(), is_suggestion: false }
    }

    #[test]
    fn minimal_prompt_has_time_guardrails_and_tail() {
        let builder = PromptBuilder::new(16_000);
        let input = PromptInput {
            query: "hello",
            character: None,
            conversation_block: "",
            overrides: &[],
            domain: None,
            kb_chunks: &[],
            web_results: &[],
            now: now(),
            is_statistical: false,
        };
        let prompt = builder.build(&input);
        assert!(prompt.contains("CURRENT DATE & TIME"));
        assert!(prompt.contains("ACCURACY GUARDRAILS"));
        assert!(prompt.ends_with("Respond as the assistant in first person:"));
        assert!(prompt.contains("User: hello"));
    }

    #[test]
    fn overrides_render_before_kb_and_are_flagged_first_priority() {
        let builder = PromptBuilder::new(16_000);
        let overrides = vec![chunk("NBA_override", "Always mention injury status", true)];
        let kb = vec![chunk("doc1", "some context", false)];
        let input = PromptInput {
            query: "who is playing",
            character: None,
            conversation_block: "",
            overrides: &overrides,
            domain: None,
            kb_chunks: &kb,
            web_results: &[],
            now: now(),
            is_statistical: false,
        };
        let prompt = builder.build(&input);
        let override_pos = prompt.find("CRITICAL BEHAVIOR OVERRIDES").unwrap();
        let kb_pos = prompt.find("KNOWLEDGE BASE CONTEXT").unwrap();
        assert!(override_pos < kb_pos);
        assert!(prompt.contains("FIRST PRIORITY"));
    }

    #[test]
    fn section_order_is_fixed() {
        let builder = PromptBuilder::new(16_000);
        let character = CharacterProfile { name: "Daredevil".into(), ..Default::default() };
        let overrides = vec![chunk("ov", "never discuss X", true)];
        let domain = DomainContext { name: "nba".into(), matched_tokens: vec!["lakers".into()], priority_boost: 2.0, emoji: "🏀".into() };
        let kb = vec![chunk("doc1", "kb content", false)];
        let web_results = vec![web("Wiki", "some web content")];

        let input = PromptInput {
            query: "tell me about the lakers",
            character: Some(&character),
            conversation_block: "RECENT CONVERSATION:\nUser: hi\n",
            overrides: &overrides,
            domain: Some(&domain),
            kb_chunks: &kb,
            web_results: &web_results,
            now: now(),
            is_statistical: false,
        };
        let prompt = builder.build(&input);

        let positions = [
            prompt.find("CURRENT DATE & TIME").unwrap(),
            prompt.find("NAME: Daredevil").unwrap(),
            prompt.find("RECENT CONVERSATION").unwrap(),
            prompt.find("CRITICAL BEHAVIOR OVERRIDES").unwrap(),
            prompt.find("DOMAIN CONTEXT").unwrap(),
            prompt.find("KNOWLEDGE BASE CONTEXT").unwrap(),
            prompt.find("WEB SEARCH RESULTS").unwrap(),
            prompt.find("ACCURACY GUARDRAILS").unwrap(),
            prompt.find("IMPORTANT:").unwrap(),
            prompt.find("User: tell me about the lakers").unwrap(),
        ];
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn oversized_kb_context_is_truncated_from_the_tail_not_guardrails() {
        let builder = PromptBuilder::new(400);
        let kb: Vec<Chunk> = (0..20).map(|i| chunk(&format!("doc{i}"), &"x".repeat(100), false)).collect();
        let input = PromptInput {
            query: "q",
            character: None,
            conversation_block: "",
            overrides: &[],
            domain: None,
            kb_chunks: &kb,
            web_results: &[],
            now: now(),
            is_statistical: false,
        };
        let prompt = builder.build(&input);
        assert!(prompt.len() <= 400);
        assert!(prompt.contains("ACCURACY GUARDRAILS"));
        assert!(prompt.contains("User: q"));
    }

    #[test]
    fn statistical_query_gets_exact_figure_instruction() {
        let builder = PromptBuilder::new(16_000);
        let kb = vec![chunk("doc1", "he averaged 27.3 points in 2023", false)];
        let input = PromptInput {
            query: "how many points per game did he average in 2023",
            character: None,
            conversation_block: "",
            overrides: &[],
            domain: None,
            kb_chunks: &kb,
            web_results: &[],
            now: now(),
            is_statistical: true,
        };
        let prompt = builder.build(&input);
        assert!(prompt.contains("statistical question"));
        assert!(prompt.contains("do not round or approximate"));
    }

    #[test]
    fn non_statistical_query_keeps_general_instruction() {
        let builder = PromptBuilder::new(16_000);
        let kb = vec![chunk("doc1", "some general context", false)];
        let input = PromptInput {
            query: "tell me about the team",
            character: None,
            conversation_block: "",
            overrides: &[],
            domain: None,
            kb_chunks: &kb,
            web_results: &[],
            now: now(),
            is_statistical: false,
        };
        let prompt = builder.build(&input);
        assert!(!prompt.contains("statistical question"));
        assert!(prompt.contains("Use the knowledge base context when it is relevant"));
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let builder = PromptBuilder::new(16_000);
        let kb = vec![chunk("doc1", "content", false)];
        let make = || PromptInput {
            query: "q",
            character: None,
            conversation_block: "",
            overrides: &[],
            domain: None,
            kb_chunks: &kb,
            web_results: &[],
            now: now(),
            is_statistical: false,
        };
        assert_eq!(builder.build(&make()), builder.build(&make()));
    }
}
