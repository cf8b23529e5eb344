//! Single-use password reset tokens kept in Redis with a TTL.

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::errors::AppError;

pub const RESET_TOKEN_TTL_SECS: u64 = 60 * 60;
const TOKEN_LEN: usize = 48;

fn reset_key(token: &str) -> String {
    format!("password_reset:{token}")
}

pub fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Tokens are alphanumeric and fixed length; anything else cannot be ours.
pub fn looks_like_reset_token(token: &str) -> bool {
    token.len() == TOKEN_LEN && token.chars().all(|c| c.is_ascii_alphanumeric())
}

pub async fn store_reset_token(
    redis: &redis::Client,
    token: &str,
    user_id: Uuid,
) -> Result<(), AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(reset_key(token))
        .arg(user_id.to_string())
        .arg("EX")
        .arg(RESET_TOKEN_TTL_SECS)
        .query_async::<_, ()>(&mut conn)
        .await?;
    Ok(())
}

/// Atomically reads and deletes the token so it can be used only once.
pub async fn consume_reset_token(
    redis: &redis::Client,
    token: &str,
) -> Result<Option<Uuid>, AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let user_id: Option<String> = redis::cmd("GETDEL")
        .arg(reset_key(token))
        .query_async(&mut conn)
        .await?;
    Ok(user_id.and_then(|id| Uuid::parse_str(&id).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_well_formed_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert!(looks_like_reset_token(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(!looks_like_reset_token("short"));
        assert!(!looks_like_reset_token(&"!".repeat(TOKEN_LEN)));
    }

    #[test]
    fn test_key_namespace() {
        assert_eq!(reset_key("abc"), "password_reset:abc");
    }
}
