use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use perspective::config::Config;
use perspective::countries::repository::PgCountryRepository;
use perspective::db::{create_pool, run_migrations};
use perspective::feeds::repository::PgScrapedFeedRepository;
use perspective::feeds::scraper::ScraperRunner;
use perspective::generation::repository::PgGenerationRepository;
use perspective::generation::tracker::GenerationTracker;
use perspective::llm_client::{CompletionService, LlmClient};
use perspective::routes::build_router;
use perspective::state::AppState;
use perspective::tracking::repository::PgTrackingRepository;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Perspective API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        config.llm_timeout,
    )?;
    info!("LLM client initialized (model: {})", llm.model());
    let llm: Arc<dyn CompletionService> = Arc::new(llm);

    let countries = Arc::new(PgCountryRepository::new(db.clone()));
    let tracker = GenerationTracker::new(
        Arc::new(PgGenerationRepository::new(db.clone())),
        countries.clone(),
        llm.clone(),
    );

    // Jobs still PENDING belong to workers from a previous process.
    tracker.fail_orphaned().await?;

    let state = AppState {
        countries,
        feeds: Arc::new(PgScrapedFeedRepository::new(db.clone())),
        tracker: tracker.clone(),
        tracking: Arc::new(PgTrackingRepository::new(db.clone())),
        completion: llm,
        scraper: ScraperRunner::new(
            config.scraper_python.clone(),
            config.scraper_script.clone(),
            config.daily_summary_script.clone(),
        ),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let in_flight = tracker.registry().in_flight().await;
    if in_flight > 0 {
        info!("Waiting for {in_flight} generation worker(s) to finish");
    }
    tracker.registry().drain().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
