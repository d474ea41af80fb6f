//! RDR2-Agent: hybrid retrieval question answering for Red Dead Redemption 2
//!
//! This is the main entry point for the application.

use anyhow::{bail, Context, Result};
use rdr2_agent::{
    config::{self, Settings},
    knowledge::{Corpus, MemoryIndex},
    network::HttpClient,
    orchestrator::Orchestrator,
    reasoning::GeminiReasoner,
    retrieval::{
        HttpSearchProvider, HttpVectorIndex, SearchProvider, Serper, SimilarityScorer,
        UnconfiguredProvider, VectorIndex, WebRetriever,
    },
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let Some(config_path) = parse_args()? else {
        return Ok(());
    };

    // Load configuration
    let settings = config::load(config_path.as_deref())?;

    // Initialize logging
    let default_level = if settings.general.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Starting RDR2-Agent v{}", rdr2_agent::VERSION);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    let orchestrator = build_orchestrator(&settings, client).await?;

    // Create router
    let app = create_router(AppState::new(settings.clone(), orchestrator));

    // Bind address
    let addr = SocketAddr::new(
        settings
            .server
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address {}", settings.server.bind_address))?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire the collaborators named in the settings into an orchestrator
async fn build_orchestrator(settings: &Settings, client: HttpClient) -> Result<Orchestrator> {
    let index: Arc<dyn VectorIndex> = match settings.knowledge.vector_service_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            info!("Using vector service at {}", url);
            Arc::new(HttpVectorIndex::new(client.clone(), url))
        }
        _ => {
            let corpus =
                Corpus::load_dir(&settings.knowledge.path, settings.knowledge.min_block_chars)?;
            if corpus.is_empty() {
                warn!("Knowledge corpus is empty, every query will need web search");
            }
            Arc::new(MemoryIndex::new(&corpus))
        }
    };
    let scorer = SimilarityScorer::new(index).with_max_distance(settings.knowledge.max_distance);
    if let Some(count) = scorer.document_count().await {
        info!("Knowledge index {} holds {} documents", scorer.index_name(), count);
    }

    let provider: Arc<dyn SearchProvider> =
        match Serper::from_settings(&settings.web, &settings.general.domain) {
            Some(engine) => {
                if settings.web.scrape_top_result {
                    info!("Scraping top web results via {}", settings.web.scrape_endpoint);
                }
                Arc::new(HttpSearchProvider::new(client.clone(), engine))
            }
            None => {
                warn!("SERPER_API_KEY not set, web search is disabled");
                Arc::new(UnconfiguredProvider::new("serper"))
            }
        };

    let Some(reasoner) = GeminiReasoner::from_settings(client, &settings.reasoning) else {
        bail!("GEMINI_API_KEY is required (or set reasoning.api_key in settings.yml)");
    };
    info!("Reasoning with model {}", settings.reasoning.model);

    Ok(Orchestrator::new(
        scorer,
        WebRetriever::new(provider),
        Arc::new(reasoner),
        settings.general.domain.clone(),
        settings.pipeline.clone(),
    ))
}

/// Parse command line arguments; `None` when the process should exit
fn parse_args() -> Result<Option<Option<PathBuf>>> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => match args.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => bail!("{} requires a file path", arg),
            },
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("rdr2-agent {}", rdr2_agent::VERSION);
                return Ok(None);
            }
            other => bail!("Unknown argument: {}", other),
        }
    }

    Ok(Some(config_path))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
RDR2-Agent v{}
Answers Red Dead Redemption 2 questions from curated knowledge and web search

USAGE:
    rdr2-agent [OPTIONS]

OPTIONS:
    -c, --config <FILE>    Path to configuration file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    RDR2_SETTINGS_PATH       Path to settings.yml
    RDR2_DEBUG               Enable debug logging (true/false)
    RDR2_PORT                Server port
    RDR2_BIND_ADDRESS        Bind address
    RDR2_KNOWLEDGE_PATH      Directory of curated .txt knowledge files
    RDR2_VECTOR_SERVICE_URL  External nearest-neighbour service
    SERPER_API_KEY           Web search API key
    GEMINI_API_KEY           Language model API key
    RDR2_LLM_MODEL           Language model name
"#,
        rdr2_agent::VERSION
    );
}
