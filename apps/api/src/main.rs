mod assistant;
mod config;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::memory::ConversationMemory;
use crate::assistant::router::{AssistantSettings, ConversationRouter};
use crate::config::Config;
use crate::llm_client::{InferenceProvider, LlmClient, LlmSettings};
use crate::matching::embedding_cache::EmbeddingCache;
use crate::matching::pipeline::{MatchPipeline, PipelineSettings};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize inference provider (completions + embeddings)
    let provider: Arc<dyn InferenceProvider> = Arc::new(LlmClient::new(LlmSettings {
        anthropic_api_key: config.anthropic_api_key.clone(),
        embedding_api_key: config.embedding_api_key.clone(),
        embedding_api_url: config.embedding_api_url.clone(),
        embedding_model: config.embedding_model.clone(),
        timeout: config.provider_timeout,
    }));
    info!(
        "LLM client initialized (model: {}, embeddings: {})",
        llm_client::MODEL,
        config.embedding_model
    );

    // Embedding cache lives for the whole process
    let cache = Arc::new(match config.embedding_cache_capacity {
        Some(capacity) => {
            info!("Embedding cache capped at {capacity} entries");
            EmbeddingCache::with_capacity(provider.clone(), capacity)
        }
        None => EmbeddingCache::unbounded(provider.clone()),
    });

    let pipeline = MatchPipeline::new(
        provider.clone(),
        cache,
        PipelineSettings {
            provider_timeout: config.provider_timeout,
            request_deadline: config.request_deadline,
            resume_char_budget: config.resume_char_budget,
            batch_concurrency: config.batch_concurrency,
        },
    );

    let memory = Arc::new(ConversationMemory::with_idle_timeout(
        config.memory_max_turns,
        config.conversation_idle_timeout,
    ));
    let assistant = ConversationRouter::new(
        provider,
        memory.clone(),
        AssistantSettings {
            provider_timeout: config.provider_timeout,
            request_deadline: config.request_deadline,
        },
    );

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        assistant: Arc::new(assistant),
        memory,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins to the web app's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
