mod accounts;
mod admin;
mod auth;
mod career;
mod chat;
mod config;
mod db;
mod email;
mod errors;
mod llm_client;
mod models;
mod placements;
mod resumes;
mod routes;
mod skills;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::db::create_pool;
use crate::email::Mailer;
use crate::llm_client::LlmClient;
use crate::resumes::ats::{AtsScorer, KeywordAtsScorer, LlmAtsScorer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Launchpad API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let mailer = Mailer::new(config.smtp.as_ref())?;

    // ATS scorer (KeywordAtsScorer by default, swap via ENABLE_LLM_ATS_SCORING)
    let ats_scorer: Arc<dyn AtsScorer> = if config.enable_llm_ats_scoring {
        info!("ATS scoring: keyword + LLM");
        Arc::new(LlmAtsScorer(llm.clone()))
    } else {
        info!("ATS scoring: keyword");
        Arc::new(KeywordAtsScorer)
    };

    let rate_limiter = Arc::new(RateLimiter::from_config(&config));
    spawn_rate_limit_sweeper(rate_limiter.clone(), config.rate_limit_window_secs);

    // Build app state
    let state = AppState {
        db,
        redis,
        s3,
        llm,
        mailer,
        rate_limiter,
        ats_scorer,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to APP_BASE_URL once the web client ships

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Connect info feeds the per-IP rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "launchpad-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

/// Drops expired rate-limit windows so the map does not grow without bound.
fn spawn_rate_limit_sweeper(limiter: Arc<RateLimiter>, window_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(window_secs.max(1)));
        loop {
            interval.tick().await;
            limiter.purge_expired();
            debug!("Rate limiter tracking {} keys", limiter.tracked_keys());
        }
    });
}
