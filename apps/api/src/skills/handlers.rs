//! Axum route handlers for professional reviews and skill extraction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::validation::{normalize_list, require_non_empty};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::review::ReviewRow;
use crate::models::user::Role;
use crate::skills::prompts::{build_skills_prompt, skills_system};
use crate::skills::vote::{majority_skills, SkillAnswer, SkillVote};
use crate::state::AppState;

/// Only the most recent reviews are sent to the model.
pub const MAX_REVIEWS: i64 = 25;
const MAX_REVIEW_CHARS: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractSkillsResponse {
    pub reviews_considered: usize,
    pub reviews_parsed: u32,
    pub extracted: Vec<SkillVote>,
    pub skills: Vec<String>,
}

/// POST /api/v1/professionals/:id/reviews
pub async fn handle_create_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(professional_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewRow>), AppError> {
    if professional_id == auth.id {
        return Err(AppError::Validation("You cannot review yourself".to_string()));
    }
    let body = require_non_empty("body", &req.body)?;
    if body.chars().count() > MAX_REVIEW_CHARS {
        return Err(AppError::Validation(format!(
            "Reviews are limited to {MAX_REVIEW_CHARS} characters"
        )));
    }

    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(professional_id)
        .fetch_optional(&state.db)
        .await?;
    if role.as_deref() != Some(Role::Professional.as_str()) {
        return Err(AppError::NotFound(format!(
            "Professional {professional_id} not found"
        )));
    }

    let mut tx = state.db.begin().await?;
    sqlx::query("INSERT INTO professionals (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(professional_id)
        .execute(&mut *tx)
        .await?;
    let review = sqlx::query_as::<_, ReviewRow>(
        r#"
        INSERT INTO professional_reviews (professional_id, reviewer_id, body)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(professional_id)
    .bind(auth.id)
    .bind(&body)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// POST /api/v1/professionals/me/skills/extract
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ExtractSkillsResponse>, AppError> {
    auth.require_role(Role::Professional)?;

    let reviews = sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT * FROM professional_reviews
        WHERE professional_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(auth.id)
    .bind(MAX_REVIEWS)
    .fetch_all(&state.db)
    .await?;
    if reviews.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No reviews to extract skills from".to_string(),
        ));
    }

    // One independent call per review; a failed or malformed answer abstains.
    let system = skills_system();
    let mut calls = JoinSet::new();
    for review in &reviews {
        let llm = state.llm.clone();
        let system = system.clone();
        let prompt = build_skills_prompt(&review.body);
        let review_id = review.id;
        calls.spawn(async move {
            match llm.call_json::<SkillAnswer>(&prompt, &system).await {
                Ok(answer) => Some(answer.into_skills()),
                Err(e) => {
                    warn!("Skill extraction failed for review {review_id}: {e}");
                    None
                }
            }
        });
    }
    let mut answers = Vec::with_capacity(reviews.len());
    while let Some(joined) = calls.join_next().await {
        let answer = joined.map_err(|e| AppError::Internal(anyhow::anyhow!("LLM task failed: {e}")))?;
        answers.push(answer);
    }

    let result = majority_skills(&answers);
    if result.voters == 0 {
        return Err(AppError::Llm("No review produced a usable skill list".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let existing: Option<SqlJson<Vec<String>>> =
        sqlx::query_scalar("SELECT skills FROM professionals WHERE user_id = $1 FOR UPDATE")
            .bind(auth.id)
            .fetch_optional(&mut *tx)
            .await?;
    let mut merged = existing.map(|s| s.0).unwrap_or_default();
    merged.extend(result.kept.iter().map(|v| v.skill.clone()));
    let merged = normalize_list(&merged);

    sqlx::query(
        r#"
        INSERT INTO professionals (user_id, skills) VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET skills = EXCLUDED.skills
        "#,
    )
    .bind(auth.id)
    .bind(SqlJson(&merged))
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "Extracted {} skills from {}/{} reviews for professional {}",
        result.kept.len(),
        result.voters,
        reviews.len(),
        auth.id
    );
    Ok(Json(ExtractSkillsResponse {
        reviews_considered: reviews.len(),
        reviews_parsed: result.voters,
        extracted: result.kept,
        skills: merged,
    }))
}
