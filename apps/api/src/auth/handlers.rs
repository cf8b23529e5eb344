//! Axum route handlers for registration, login and password recovery.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::accounts::repo::{self, NewProfile};
use crate::auth::extractor::{clear_session, session_cookie, AuthUser};
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::reset::{
    consume_reset_token, generate_reset_token, looks_like_reset_token, store_reset_token,
    RESET_TOKEN_TTL_SECS,
};
use crate::auth::token::issue_token;
use crate::auth::validation::{normalize_email, require_non_empty, validate_password};
use crate::email::templates;
use crate::errors::AppError;
use crate::models::user::{Profile, PublicUser, Role};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
    pub referral_code: Option<String>,
    pub college_name: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub college_id: Option<Uuid>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub headline: Option<String>,
    pub company: Option<String>,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    /// Also set as an HttpOnly cookie; returned for non-browser clients.
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
    pub profile: Profile,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email)?;
    validate_password(&req.password)?;
    let name = require_non_empty("name", &req.name)?;
    let role: Role = req.role.parse().map_err(AppError::Validation)?;
    if !role.is_self_registrable() {
        return Err(AppError::Validation(
            "role must be student, college or professional".to_string(),
        ));
    }
    if let Some(year) = req.graduation_year {
        if !(1950..=2100).contains(&year) {
            return Err(AppError::Validation("graduation_year is out of range".to_string()));
        }
    }

    if repo::email_taken(&state.db, &email).await? {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(req.password.clone()).await?;
    let profile = NewProfile {
        college_name: req.college_name.clone(),
        website: req.website.clone(),
        location: req.location.clone(),
        college_id: req.college_id,
        major: req.major.clone(),
        graduation_year: req.graduation_year,
        headline: req.headline.clone(),
        company: req.company.clone(),
        years_experience: req.years_experience,
    };

    let mut tx = state.db.begin().await?;
    let user = repo::insert_user(&mut tx, &email, &password_hash, role, &name).await?;
    repo::insert_profile(&mut tx, &user, role, &profile).await?;
    if let Some(code) = req.referral_code.as_deref().filter(|c| !c.trim().is_empty()) {
        repo::record_referral(&mut tx, code, user.id).await?;
    }
    tx.commit().await?;

    info!("Registered {} account {}", role, user.id);
    state
        .mailer
        .send(templates::welcome(&user.email, &user.name, role.as_str()));

    let token = issue_token(user.id, role, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    let jar = jar.add(session_cookie(token.clone(), state.config.cookie_secure));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Unknown email and wrong password produce the same error.
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email).map_err(|_| AppError::InvalidCredentials)?;
    let user = repo::find_user_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        warn!("Failed login for user {}", user.id);
        return Err(AppError::InvalidCredentials);
    }

    let role: Role = user
        .role
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    let token = issue_token(user.id, role, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    let jar = jar.add(session_cookie(token.clone(), state.config.cookie_secure));

    info!("User {} logged in", user.id);
    Ok((
        jar,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(jar: CookieJar) -> (StatusCode, CookieJar) {
    (StatusCode::NO_CONTENT, clear_session(jar))
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = repo::get_user(&state.db, auth.id).await?;
    let profile = repo::load_profile(&state.db, auth.id, auth.role).await?;
    Ok(Json(MeResponse {
        user: user.into(),
        profile,
    }))
}

/// POST /api/v1/auth/forgot-password
///
/// Always 202 so the endpoint cannot be used to probe for accounts.
pub async fn handle_forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, AppError> {
    let Ok(email) = normalize_email(&req.email) else {
        return Ok(StatusCode::ACCEPTED);
    };

    if let Some(user) = repo::find_user_by_email(&state.db, &email).await? {
        let token = generate_reset_token();
        store_reset_token(&state.redis, &token, user.id).await?;
        let reset_url = format!(
            "{}/reset-password?token={}",
            state.config.app_base_url.trim_end_matches('/'),
            token
        );
        state.mailer.send(templates::password_reset(
            &user.email,
            &user.name,
            &reset_url,
            RESET_TOKEN_TTL_SECS / 60,
        ));
        info!("Issued password reset token for user {}", user.id);
    }

    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/auth/reset-password
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    let invalid = || AppError::Validation("Reset link is invalid or has expired".to_string());

    let token = req.token.trim();
    if !looks_like_reset_token(token) {
        return Err(invalid());
    }
    validate_password(&req.new_password)?;

    let user_id = consume_reset_token(&state.redis, token)
        .await?
        .ok_or_else(invalid)?;
    let hash = hash_password_blocking(req.new_password).await?;
    repo::update_password_hash(&state.db, user_id, &hash).await?;

    info!("Password reset for user {user_id}");
    Ok(StatusCode::NO_CONTENT)
}
