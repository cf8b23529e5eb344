use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cookie_secure: bool,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Key rate limits on `X-Forwarded-For` instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
    pub enable_llm_ats_scoring: bool,
    pub app_base_url: String,
    pub smtp: Option<SmtpConfig>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        // SMTP is optional: without a host, outgoing mail is only logged.
        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                user: require_env("SMTP_USER")?,
                pass: require_env("SMTP_PASS")?,
                from: optional_env("SMTP_FROM", "Launchpad <no-reply@launchpad.local>"),
            }),
            _ => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_hours: parse_env("JWT_TTL_HOURS", "24")?,
            cookie_secure: parse_env("COOKIE_SECURE", "true")?,
            rate_limit_max: parse_env("RATE_LIMIT_MAX", "10")?,
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", "60")?,
            trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR", "false")?,
            enable_llm_ats_scoring: parse_env("ENABLE_LLM_ATS_SCORING", "false")?,
            app_base_url: optional_env("APP_BASE_URL", "http://localhost:3000"),
            smtp,
            port: parse_env("PORT", "8080")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_env(key, default)
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value"))
}

#[cfg(test)]
impl Config {
    /// Minimal config for unit tests that need signing secrets or limits.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/launchpad_test".to_string(),
            redis_url: "redis://localhost".to_string(),
            s3_bucket: "launchpad-test".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            anthropic_api_key: "test".to_string(),
            jwt_secret: "unit-test-secret".to_string(),
            jwt_ttl_hours: 24,
            cookie_secure: false,
            rate_limit_max: 3,
            rate_limit_window_secs: 60,
            trust_forwarded_for: false,
            enable_llm_ats_scoring: false,
            app_base_url: "http://localhost:3000".to_string(),
            smtp: None,
            port: 8080,
            rust_log: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("LAUNCHPAD_TEST_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage_default() {
        let result: Result<u16> = parse_env("LAUNCHPAD_TEST_UNSET_VARIABLE_2", "not-a-port");
        assert!(result.is_err());
    }
}
