use regex::Regex;
use std::sync::OnceLock;

/// Query shape used to pick a smart-clarification redirect template (§4.9
/// step 9, §10.6). Mirrors `_classify_query_type` in the original bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    CurrentStats,
    HistoricalStats,
    NewsEvents,
    Schedule,
    Comparison,
    Prediction,
    General,
}

struct PatternSet {
    query_type: QueryType,
    patterns: Vec<&'static str>,
}

fn pattern_sets() -> &'static Vec<PatternSet> {
    static SETS: OnceLock<Vec<PatternSet>> = OnceLock::new();
    SETS.get_or_init(|| {
        vec![
            PatternSet {
                query_type: QueryType::CurrentStats,
                patterns: vec![
                    r"this\s+(season|year)",
                    r"current.*stats",
                    r"how\s+many.*this",
                    r"what.*average.*this",
                    r"standings.*now",
                    r"right\s+now",
                    r"so\s+far\s+this",
                    r"currently",
                    r"at\s+the\s+moment",
                ],
            },
            PatternSet {
                query_type: QueryType::HistoricalStats,
                patterns: vec![
                    r"\b(19|20)\d{2}\b",
                    r"in.*\d{4}",
                    r"back\s+in",
                    r"used\s+to",
                    r"career.*stats",
                    r"all.*time.*record",
                    r"throughout.*career",
                    r"historically",
                    r"over.*years",
                ],
            },
            PatternSet {
                query_type: QueryType::NewsEvents,
                patterns: vec![
                    r"what.*happened",
                    r"latest.*news",
                    r"recently",
                    r"last.*race",
                    r"got.*traded",
                    r"signed.*with",
                    r"breaking.*news",
                    r"just.*announced",
                    r"yesterday",
                    r"today",
                    r"this.*week",
                ],
            },
            PatternSet {
                query_type: QueryType::Schedule,
                patterns: vec![
                    r"when.*next",
                    r"schedule.*for",
                    r"what.*time",
                    r"upcoming.*games",
                    r"when.*is.*the",
                    r"what.*day",
                    r"tomorrow.*race",
                    r"this.*weekend",
                ],
            },
            PatternSet {
                query_type: QueryType::Comparison,
                patterns: vec![
                    r"better.*than",
                    r"vs\.?",
                    r"versus",
                    r"compare.*to",
                    r"who.*best",
                    r"which.*is.*better",
                    r"stronger.*than",
                    r"faster.*than",
                ],
            },
            PatternSet {
                query_type: QueryType::Prediction,
                patterns: vec![
                    r"who.*will.*win",
                    r"predict",
                    r"odds.*for",
                    r"chances.*of",
                    r"going.*to.*win",
                    r"likely.*to",
                    r"think.*will",
                ],
            },
        ]
    })
}

fn compiled() -> &'static Vec<(QueryType, Vec<Regex>)> {
    static COMPILED: OnceLock<Vec<(QueryType, Vec<Regex>)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        pattern_sets()
            .iter()
            .map(|set| {
                let regexes = set
                    .patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("static clarification pattern"))
                    .collect();
                (set.query_type, regexes)
            })
            .collect()
    })
}

/// Classifies a query into one of the redirect categories. First matching
/// pattern set wins, falling through to `General` (§4.9 step 9).
pub fn classify_query_type(query: &str) -> QueryType {
    let lower = query.to_lowercase();
    for (query_type, regexes) in compiled() {
        if regexes.iter().any(|re| re.is_match(&lower)) {
            return *query_type;
        }
    }
    QueryType::General
}

/// Builds the redirect body for a query type, generic over whatever domain
/// (if any) was active — the original hardcodes F1/NBA copy; here the
/// domain name and emoji are interpolated so the same template works for
/// any configured domain.
pub fn redirect_body(query_type: QueryType, domain: Option<(&str, &str)>) -> String {
    let (label, emoji) = domain.unwrap_or(("this topic", "\u{1f4ca}"));

    match query_type {
        QueryType::CurrentStats => format!(
            "I don't have access to current, real-time statistics for {label}.\n\n\
             For up-to-date numbers I'd recommend checking an official {label} source or a live stats site.\n\n\
             Alternatively, I can help you with:\n\
             {emoji} Historical {label} achievements and records\n\
             {emoji} Background and context on {label}\n\
             {emoji} How the relevant rules or systems work\n\n\
             What would you like to explore instead?"
        ),
        QueryType::HistoricalStats => format!(
            "I have some historical data on {label}, but I might not have the exact figures you're after from that specific period.\n\n\
             For precise historical records, an official archive or statistics site will have the full detail.\n\n\
             I can help you with:\n\
             {emoji} Major milestones and turning points\n\
             {emoji} Context on what made a period significant\n\
             {emoji} Comparisons across eras\n\n\
             What aspect of {label}'s history interests you most?"
        ),
        QueryType::NewsEvents => format!(
            "I don't have live access to breaking news about {label} — my knowledge has a cutoff and doesn't update in real time.\n\n\
             For the latest news, a live news source or official channel will be more reliable.\n\n\
             I can still help with background, context, or history around {label}.\n\n\
             What would be useful?"
        ),
        QueryType::Schedule => format!(
            "I don't have a live schedule for {label} — upcoming dates and times change and I can't verify them in real time.\n\n\
             An official schedule page will have the current details.\n\n\
             I can help with background on how {label} events are typically structured instead. Interested?"
        ),
        QueryType::Comparison => format!(
            "Comparisons like this depend a lot on which numbers you're weighing, and I want to make sure I'm not guessing with stale data for {label}.\n\n\
             I can walk through what each side is known for, or you can point me at the specific stats you want compared. Which would help more?"
        ),
        QueryType::Prediction => format!(
            "I can't reliably predict outcomes for {label} — that depends on current form and circumstances I don't have live access to.\n\n\
             I can talk through historical patterns or context that might inform your own view, if that's useful."
        ),
        QueryType::General => format!(
            "I don't have confident, specific information to answer that about {label} right now.\n\n\
             I can help with background, history, or general context instead — what would be most useful?"
        ),
    }
}

/// Builds the full smart-clarification prompt (§4.9 step 9's clarification
/// branch), mirroring `_create_smart_clarification_prompt`.
pub fn build_clarification_prompt(persona: &str, query: &str, domain: Option<(&str, &str)>) -> String {
    let query_type = classify_query_type(query);
    let redirect = redirect_body(query_type, domain);

    format!(
        "You are {persona}. The user asked: \"{query}\"\n\n\
         {redirect}\n\n\
         IMPORTANT INSTRUCTIONS:\n\
         - Respond in FIRST PERSON as {persona}\n\
         - Use the suggested redirect content above as your response\n\
         - Keep it conversational and maintain your personality\n\
         - Be helpful and engaging, not dismissive\n\
         - Show genuine interest in helping them find what they need\n\n\
         User: {query}\n\
         Respond as {persona} with the redirect above:"
    )
}
