use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tracing::info;

use ac_core::{CancellationToken, Timeouts};
use ac_inference::{create_embedder, create_model, InferenceConfig, PromptFactory};
use ac_ingest::{spawn_seed_ingestion, Analyzer, HttpFetcher, IngestionFacade};
use ac_query::{ArticleService, ChatService, ResponseCache};
use ac_storage::{create_index, create_store, IndexBackend, StorageConfig, StoreBackend};
use ac_web::AppState;

mod config;

use config::{FileConfig, TimeoutOverrides};

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with a collection of news articles", long_about = None)]
struct Cli {
    /// TOML file with seed URLs, timeouts and prompt overrides.
    #[arg(long, env = "AC_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, env = "AC_STORAGE", default_value_t = StoreBackend::Memory)]
    storage: StoreBackend,
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:articles.db")]
    database_url: String,
    #[arg(long, value_enum, env = "AC_VECTOR", default_value_t = IndexBackend::Memory)]
    vector: IndexBackend,
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6334")]
    qdrant_url: String,
    #[arg(long, default_value = "articles")]
    collection: String,

    #[arg(
        long,
        env = "LLM_PROVIDER",
        default_value = "dummy",
        help = "Generative model: dummy (default), openai, deepseek, gemini, ollama"
    )]
    model: String,
    #[arg(long)]
    model_name: Option<String>,
    #[arg(long)]
    model_url: Option<String>,
    /// Key for the selected provider; defaults to the provider's own variable.
    #[arg(long, env = "AC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, hide = true)]
    openai_api_key: Option<String>,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, hide = true)]
    gemini_api_key: Option<String>,
    #[arg(long, default_value = "hashing", help = "Embedder: hashing (default), openai, ollama")]
    embedder: String,
    #[arg(long)]
    prompts_dir: Option<PathBuf>,

    #[arg(long)]
    generation_timeout: Option<u64>,
    #[arg(long)]
    store_timeout: Option<u64>,
    #[arg(long)]
    fetch_timeout: Option<u64>,
    #[arg(long)]
    request_timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API, ingesting configured seed URLs in the background.
    Serve {
        #[arg(long, env = "AC_BIND")]
        bind: Option<String>,
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Fetch, analyse and store one or more articles.
    Ingest {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Ask a question about the stored articles.
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Most mentioned entities across the given articles, or all of them.
    Entities {
        urls: Vec<String>,
        #[arg(long, default_value_t = ac_core::DEFAULT_ENTITY_LIMIT)]
        limit: usize,
    },
}

impl Cli {
    fn api_key(&self) -> Option<String> {
        if self.api_key.is_some() {
            return self.api_key.clone();
        }
        match self.model.trim().to_lowercase().as_str() {
            "gemini" => self.gemini_api_key.clone(),
            _ => self.openai_api_key.clone(),
        }
    }

    fn timeouts(&self, file: &FileConfig) -> Timeouts {
        TimeoutOverrides {
            generation: self.generation_timeout,
            store: self.store_timeout,
            fetch: self.fetch_timeout,
            request: self.request_timeout,
        }
        .apply(file.timeouts)
    }

    fn storage(&self) -> StorageConfig {
        StorageConfig {
            store: self.storage,
            database_url: self.database_url.clone(),
            index: self.vector,
            qdrant_url: self.qdrant_url.clone(),
            collection: self.collection.clone(),
        }
    }

    fn inference(&self, timeouts: &Timeouts) -> InferenceConfig {
        InferenceConfig {
            provider: self.model.clone(),
            model_name: self.model_name.clone(),
            model_url: self.model_url.clone(),
            api_key: self.api_key(),
            embedder: self.embedder.clone(),
            request_timeout: timeouts.generation(),
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => fmt().with_env_filter(env_filter).with_target(false).init(),
        LogFormat::Json => fmt().json().with_env_filter(env_filter).init(),
    }
}

/// Everything the subcommands need, wired from the configuration.
struct Services {
    chat: Arc<ChatService>,
    ingestion: Arc<IngestionFacade>,
    timeouts: Timeouts,
}

async fn build_services(cli: &Cli, file: &FileConfig) -> anyhow::Result<Services> {
    let timeouts = cli.timeouts(file);
    let inference = cli.inference(&timeouts);

    let model = create_model(&inference).context("creating generative model")?;
    let embedder = create_embedder(&inference).context("creating embedder")?;
    info!("🧠 Inference model initialized (using {})", model.name());

    let storage = cli.storage();
    let store = create_store(&storage).await.context("opening article store")?;
    let index = create_index(&storage, embedder)
        .await
        .context("connecting vector index")?;
    info!(store = ?storage.store, index = ?storage.index, "💾 Storage initialized");

    let prompts_dir = cli.prompts_dir.as_ref().or(file.prompts_dir.as_ref());
    let prompts = Arc::new(match prompts_dir {
        Some(dir) => PromptFactory::from_dir(dir).context("loading prompt templates")?,
        None => PromptFactory::builtin(),
    });

    let articles = Arc::new(ArticleService::new(
        store.clone(),
        index.clone(),
        model.clone(),
        prompts.clone(),
        timeouts,
    ));
    let chat = Arc::new(ChatService::new(articles, Arc::new(ResponseCache::new())));

    let fetcher = Arc::new(HttpFetcher::new(timeouts.fetch())?);
    let analyzer = Analyzer::new(model, prompts, timeouts);
    let ingestion = Arc::new(IngestionFacade::new(store, index, fetcher, analyzer, timeouts));

    Ok(Services {
        chat,
        ingestion,
        timeouts,
    })
}

fn bind_address(bind: Option<String>, port: Option<u16>) -> String {
    bind.unwrap_or_else(|| format!("0.0.0.0:{}", port.unwrap_or(DEFAULT_PORT)))
}

async fn serve(services: Services, seed_urls: Vec<String>, addr: String) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let seeding = (!seed_urls.is_empty()).then(|| {
        info!(count = seed_urls.len(), "🌱 Ingesting seed articles in the background");
        spawn_seed_ingestion(services.ingestion.clone(), seed_urls, shutdown.child_token())
    });

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            signal.cancel();
        }
    });

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let state = AppState::new(services.chat, services.ingestion, services.timeouts);
    ac_web::serve(listener, state, shutdown.clone()).await?;

    shutdown.cancel();
    if let Some(handle) = seeding {
        match handle.await {
            Ok(report) => info!(?report, "seed ingestion stopped"),
            Err(e) => tracing::warn!(error = %e, "seed ingestion task failed"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let file = FileConfig::load_or_default(cli.config.as_deref())?;
    let services = build_services(&cli, &file).await?;
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Serve { bind, port } => {
            serve(services, file.seed_urls, bind_address(bind, port)).await?;
        }
        Commands::Ingest { urls } => {
            for url in urls {
                let article = services.ingestion.add_new_article(&url, &cancel).await?;
                info!("📰 Stored {}", article.url);
                println!("{}", serde_json::to_string_pretty(&article)?);
            }
        }
        Commands::Ask { query } => {
            let answer = services.chat.answer(&query.join(" "), &cancel).await?;
            println!("{}", answer.answer);
        }
        Commands::Entities { urls, limit } => {
            let entities = services
                .chat
                .articles()
                .top_entities(&urls, limit, &cancel)
                .await?;
            for (rank, entity) in entities.iter().enumerate() {
                println!("{}. {} ({} mentions)", rank + 1, entity.entity, entity.count);
            }
        }
    }

    Ok(())
}
