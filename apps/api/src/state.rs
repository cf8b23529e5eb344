use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::email::Mailer;
use crate::llm_client::LlmClient;
use crate::resumes::ats::AtsScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Holds short-lived password reset tokens.
    pub redis: RedisClient,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub mailer: Mailer,
    pub rate_limiter: Arc<RateLimiter>,
    /// Pluggable ATS scorer. Default: KeywordAtsScorer. Swap via ENABLE_LLM_ATS_SCORING.
    pub ats_scorer: Arc<dyn AtsScorer>,
    pub config: Config,
}
