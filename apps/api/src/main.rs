mod catalog;
mod config;
mod counsellor;
mod db;
mod errors;
mod llm_client;
mod models;
mod profile;
mod routes;
mod state;
mod tracking;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AdvisorMode, Config};
use crate::counsellor::advisor::{Advisor, LlmAdvisor, RuleBasedAdvisor};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
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

    info!("Starting Counsellor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Pick the advisor backend
    let advisor = build_advisor(&config)?;

    let state = AppState { db, advisor };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_advisor(config: &Config) -> Result<Arc<dyn Advisor>> {
    match (config.advisor_mode(), config.gemini_api_key.clone()) {
        (AdvisorMode::Llm, Some(key)) => {
            let llm = LlmClient::new(key)?;
            info!("LLM advisor initialized (model: {})", llm_client::MODEL);
            Ok(Arc::new(LlmAdvisor::new(llm)))
        }
        _ => {
            warn!("No usable GEMINI_API_KEY configured; chat runs on the rule-based advisor");
            Ok(Arc::new(RuleBasedAdvisor))
        }
    }
}
