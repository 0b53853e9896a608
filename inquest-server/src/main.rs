//! Inquest server — HTTP front end for the investigative research engine.
//!
//! Accepts investigation requests, runs each one as a background pipeline,
//! and streams progress back to clients over SSE.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use inquest_core::brain::Brain;
use inquest_core::config::load_config;
use inquest_core::engine::InvestigationEngine;
use inquest_core::providers::create_provider;
use inquest_core::session::SessionStore;
use inquest_core::tools::ToolRegistry;
use inquest_server::routes::{self, AppState};
use inquest_tools::register_builtin_tools;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Inquest: automated investigative research over pluggable sources
#[derive(Parser, Debug)]
#[command(name = "inquest-server", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "inquest_core={level},inquest_tools={level},inquest_server={level},tower_http=info"
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    for warning in config.llm.validate() {
        warn!("{warning}");
    }

    let provider = create_provider(&config.llm).context("initializing LLM provider")?;
    info!(provider = %config.llm.provider, model = %provider.model_name(), "LLM provider ready");
    let brain = Arc::new(Brain::new(provider, &config.llm));

    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, &config.tools).context("registering retrieval tools")?;
    info!(tools = ?registry.names(), default = ?registry.default_tool_name(), "Retrieval tools ready");

    let store = Arc::new(SessionStore::new());
    spawn_session_sweeper(store.clone(), config.server.session_ttl_secs);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let poll_interval = Duration::from_millis(config.server.poll_interval_ms);
    let engine = Arc::new(InvestigationEngine::new(
        brain,
        Arc::new(registry),
        config,
    ));

    let state = AppState {
        engine,
        store,
        poll_interval,
        started_at: Utc::now(),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, "Inquest server listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}

/// Periodically reclaim closed sessions whose client never drained them.
fn spawn_session_sweeper(store: Arc<SessionStore>, ttl_secs: u64) {
    let ttl = Duration::from_secs(ttl_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ttl);
        interval.tick().await; // the first tick fires immediately
        loop {
            interval.tick().await;
            let removed = store.sweep_expired(ttl);
            if removed > 0 {
                info!(removed, "Swept abandoned sessions");
            }
        }
    });
}
