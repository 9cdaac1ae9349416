mod store;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hrp_config::PipelineConfig;
use hrp_llm::{OllamaProvider, OpenRouterProvider};
use hrp_memory::SessionMemory;
use hrp_orchestrator::{Orchestrator, OrchestratorDeps, PipelineStats, Query};
use hrp_prompt::CharacterProfile;
use hrp_websearch::{DuckDuckGoProvider, WikipediaProvider};

use store::JsonFileStore;

const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
const DEFAULT_SESSION_PATH: &str = ".hrp/sessions.redb";

#[derive(Debug, Parser)]
#[command(name = "hrp", version, about = "Hybrid Response Pipeline demonstration harness")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// User identifier for this run's turns.
    #[arg(long, global = true, default_value = "cli-user")]
    user: String,

    /// Path to a JSON document file backing the demonstration vector store.
    #[arg(long, global = true)]
    knowledge: Option<String>,

    /// LLM provider to use.
    #[arg(long, global = true, default_value = "ollama")]
    provider: ProviderKind,

    /// Model name passed to the chosen provider.
    #[arg(long, global = true, default_value = "llama3")]
    model: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProviderKind {
    Ollama,
    Openrouter,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read lines from stdin and run each through the pipeline.
    Chat,
    /// Run a single query and print the response.
    Ask {
        query: String,
    },
    /// Print a read-only diagnostic snapshot (breaker state, domain distribution).
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = PipelineConfig::load_from(DEFAULT_CONFIG_PATH)?;
    let memory = SessionMemory::open(DEFAULT_SESSION_PATH, &config.session)?;

    let store: Arc<dyn hrp_retrieval::VectorStore> = match &cli.knowledge {
        Some(path) => Arc::new(JsonFileStore::load(path)?),
        None => Arc::new(JsonFileStore::empty()),
    };

    let llm_provider: Arc<dyn hrp_llm::LlmProvider> = match cli.provider {
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(cli.model.clone())),
        ProviderKind::Openrouter => Arc::new(OpenRouterProvider::new(cli.model.clone())),
    };

    let deps = OrchestratorDeps {
        store,
        web_providers: vec![Arc::new(WikipediaProvider::new()), Arc::new(DuckDuckGoProvider::new())],
        llm_provider,
        character: CharacterProfile::default(),
    };
    let orchestrator = Orchestrator::new(config, memory, deps);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat_loop(&orchestrator, &cli.user).await,
        Commands::Ask { query } => {
            let response = ask(&orchestrator, &cli.user, &query).await;
            print_response(&response);
            Ok(())
        }
        Commands::Stats => {
            print_stats(&orchestrator.stats());
            Ok(())
        }
    }
}

async fn run_chat_loop(orchestrator: &Orchestrator, user: &str) -> Result<()> {
    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            print!("> ");
            io::stdout().flush()?;
            continue;
        }
        let response = ask(orchestrator, user, &line).await;
        print_response(&response);
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}

async fn ask(orchestrator: &Orchestrator, user: &str, text: &str) -> hrp_orchestrator::Response {
    let query = Query::new(text, user, orchestrator.next_request_id());
    orchestrator.handle(query).await
}

fn print_response(response: &hrp_orchestrator::Response) {
    println!("{} {}", response.prefix_tag, response.content);
    if !response.sources.is_empty() {
        println!("sources:");
        for source in &response.sources {
            println!("  - {source}");
        }
    }
}

fn print_stats(stats: &PipelineStats) {
    println!("── pipeline stats ───────────────────────────────────");
    println!("domains in use:");
    for (domain, count) in &stats.domain_counts {
        println!("  {domain:<16} {count}");
    }
    println!("breakers:");
    println!("  rag_search  open={} failures={}", stats.rag_breaker.open, stats.rag_breaker.failures);
    println!("  web_search  open={} failures={}", stats.web_breaker.open, stats.web_breaker.failures);
    println!("  llm         open={} failures={}", stats.llm_breaker.open, stats.llm_breaker.failures);
}
