//! Account settings: profile edits, password change and account deletion.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::Value;
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::accounts::repo;
use crate::auth::extractor::clear_session;
use crate::auth::handlers::MeResponse;
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::validation::{normalize_list, require_non_empty, validate_password};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

const MAX_LIST_ITEMS: usize = 50;

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    // student
    pub college_id: Option<Uuid>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub quiz_answers: Option<Value>,
    // college
    pub college_name: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    // professional
    pub headline: Option<String>,
    pub company: Option<String>,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// GET /api/v1/me/profile
pub async fn handle_get_profile(
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

/// PUT /api/v1/me/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let skills = req.skills.as_deref().map(checked_list).transpose()?;
    let interests = req.interests.as_deref().map(checked_list).transpose()?;
    if let Some(answers) = &req.quiz_answers {
        if !answers.is_object() {
            return Err(AppError::Validation("quiz_answers must be an object".to_string()));
        }
    }
    if matches!(req.years_experience, Some(y) if !(0..=70).contains(&y)) {
        return Err(AppError::Validation("years_experience is out of range".to_string()));
    }

    let mut tx = state.db.begin().await?;

    if let Some(name) = &req.name {
        let name = require_non_empty("name", name)?;
        sqlx::query("UPDATE users SET name = $1, updated_at = now() WHERE id = $2")
            .bind(name)
            .bind(auth.id)
            .execute(&mut *tx)
            .await?;
    }

    match auth.role {
        Role::Student => {
            sqlx::query(
                r#"
                INSERT INTO students (user_id, college_id, major, graduation_year, skills, interests, quiz_answers)
                VALUES ($1, $2, $3, $4, COALESCE($5, '[]'::jsonb), COALESCE($6, '[]'::jsonb), COALESCE($7, '{}'::jsonb))
                ON CONFLICT (user_id) DO UPDATE SET
                    college_id = COALESCE($2, students.college_id),
                    major = COALESCE($3, students.major),
                    graduation_year = COALESCE($4, students.graduation_year),
                    skills = COALESCE($5, students.skills),
                    interests = COALESCE($6, students.interests),
                    quiz_answers = COALESCE($7, students.quiz_answers)
                "#,
            )
            .bind(auth.id)
            .bind(req.college_id)
            .bind(&req.major)
            .bind(req.graduation_year)
            .bind(skills.map(SqlJson))
            .bind(interests.map(SqlJson))
            .bind(req.quiz_answers.as_ref())
            .execute(&mut *tx)
            .await?;
        }
        Role::College => {
            let name = req
                .college_name
                .as_deref()
                .map(|n| require_non_empty("college_name", n))
                .transpose()?;
            sqlx::query(
                r#"
                UPDATE colleges SET
                    name = COALESCE($2, name),
                    website = COALESCE($3, website),
                    location = COALESCE($4, location)
                WHERE user_id = $1
                "#,
            )
            .bind(auth.id)
            .bind(name)
            .bind(&req.website)
            .bind(&req.location)
            .execute(&mut *tx)
            .await?;
        }
        Role::Professional => {
            sqlx::query(
                r#"
                INSERT INTO professionals (user_id, headline, company, years_experience, skills)
                VALUES ($1, $2, $3, $4, COALESCE($5, '[]'::jsonb))
                ON CONFLICT (user_id) DO UPDATE SET
                    headline = COALESCE($2, professionals.headline),
                    company = COALESCE($3, professionals.company),
                    years_experience = COALESCE($4, professionals.years_experience),
                    skills = COALESCE($5, professionals.skills)
                "#,
            )
            .bind(auth.id)
            .bind(&req.headline)
            .bind(&req.company)
            .bind(req.years_experience)
            .bind(skills.map(SqlJson))
            .execute(&mut *tx)
            .await?;
        }
        Role::Admin => {}
    }

    tx.commit().await?;
    info!("Updated profile for user {}", auth.id);

    handle_get_profile(State(state), auth).await
}

/// PUT /api/v1/me/password
pub async fn handle_change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate_password(&req.new_password)?;
    let user = repo::get_user(&state.db, auth.id).await?;
    if !verify_password_blocking(req.current_password, user.password_hash).await? {
        return Err(AppError::InvalidCredentials);
    }
    let hash = hash_password_blocking(req.new_password).await?;
    repo::update_password_hash(&state.db, auth.id, &hash).await?;
    info!("Password changed for user {}", auth.id);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/me
///
/// Hard delete; dependent rows go with the user through ON DELETE CASCADE.
pub async fn handle_delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), AppError> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(auth.id)
        .execute(&state.db)
        .await?;
    info!("Deleted account {}", auth.id);
    Ok((StatusCode::NO_CONTENT, clear_session(jar)))
}

fn checked_list(items: &[String]) -> Result<Vec<String>, AppError> {
    let list = normalize_list(items);
    if list.len() > MAX_LIST_ITEMS {
        return Err(AppError::Validation(format!(
            "Lists are limited to {MAX_LIST_ITEMS} items"
        )));
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_list_normalizes() {
        let list = checked_list(&["Go".into(), " go ".into(), "Rust".into()]).unwrap();
        assert_eq!(list, vec!["Go".to_string(), "Rust".to_string()]);
    }

    #[test]
    fn test_checked_list_caps_length() {
        let many: Vec<String> = (0..=MAX_LIST_ITEMS).map(|i| format!("skill{i}")).collect();
        assert!(checked_list(&many).is_err());
    }

    #[test]
    fn test_update_request_all_optional() {
        let req: UpdateProfileRequest = serde_json::from_str("{}").unwrap();
        assert!(req.name.is_none() && req.skills.is_none());
    }
}
