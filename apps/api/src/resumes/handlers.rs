//! Axum route handlers for resume uploads and ATS analysis.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::{ResumeAnalysisRow, ResumeRow};
use crate::models::user::Role;
use crate::resumes::extract::extract_pdf_text;
use crate::state::AppState;
use crate::storage::{self, DOWNLOAD_URL_TTL};

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
const MAX_JD_CHARS: usize = 20_000;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeDetailResponse {
    pub resume: ResumeRow,
    pub download_url: String,
    pub latest_analysis: Option<ResumeAnalysisRow>,
}

/// POST /api/v1/resumes
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    auth.require_any(&[Role::Student, Role::Professional])?;

    let upload = storage::read_upload(multipart, "file", MAX_RESUME_BYTES).await?;
    if upload.extension().as_deref() != Some("pdf") {
        return Err(AppError::Validation("Resumes must be uploaded as PDF".to_string()));
    }
    let size_bytes = upload.data.len() as i64;
    let text = extract_pdf_text(upload.data.clone()).await?;

    let resume_id = Uuid::new_v4();
    let s3_key = format!("resumes/{}/{}.pdf", auth.id, resume_id);
    storage::upload_object(
        &state.s3,
        &state.config.s3_bucket,
        &s3_key,
        upload.data,
        "application/pdf",
    )
    .await?;

    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, file_name, s3_key, content_type, size_bytes, extracted_text)
        VALUES ($1, $2, $3, $4, 'application/pdf', $5, $6)
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(auth.id)
    .bind(&upload.file_name)
    .bind(&s3_key)
    .bind(size_bytes)
    .bind(&text)
    .fetch_one(&state.db)
    .await?;

    info!("Stored resume {} for user {}", resume.id, auth.id);
    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    let resumes = sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(resumes))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeDetailResponse>, AppError> {
    let resume = owned_resume(&state, auth, resume_id).await?;
    let download_url = storage::presigned_url(
        &state.s3,
        &state.config.s3_bucket,
        &resume.s3_key,
        DOWNLOAD_URL_TTL,
    )
    .await?;
    let latest_analysis = sqlx::query_as::<_, ResumeAnalysisRow>(
        "SELECT * FROM resume_analyses WHERE resume_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(resume_id)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(ResumeDetailResponse {
        resume,
        download_url,
        latest_analysis,
    }))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let resume = owned_resume(&state, auth, resume_id).await?;
    sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(resume_id)
        .execute(&state.db)
        .await?;
    storage::delete_object(&state.s3, &state.config.s3_bucket, &resume.s3_key).await?;
    info!("Deleted resume {resume_id}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/analyze
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resume_id): Path<Uuid>,
    body: Option<Json<AnalyzeRequest>>,
) -> Result<(StatusCode, Json<ResumeAnalysisRow>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let job_description = request
        .job_description
        .map(|jd| jd.trim().to_string())
        .filter(|jd| !jd.is_empty());
    if job_description
        .as_ref()
        .is_some_and(|jd| jd.chars().count() > MAX_JD_CHARS)
    {
        return Err(AppError::Validation(format!(
            "job_description is limited to {MAX_JD_CHARS} characters"
        )));
    }

    let resume = owned_resume(&state, auth, resume_id).await?;
    let report = state
        .ats_scorer
        .score(&resume.extracted_text, job_description.as_deref())
        .await?;

    let breakdown: Value = serde_json::json!({
        "dimensions": report.dimensions,
        "matched_keywords": report.matched_keywords,
        "missing_keywords": report.missing_keywords,
    });

    let analysis = sqlx::query_as::<_, ResumeAnalysisRow>(
        r#"
        INSERT INTO resume_analyses
            (resume_id, ats_score, breakdown, suggestions, scorer_backend, job_description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(report.overall_score as i32)
    .bind(&breakdown)
    .bind(SqlJson(&report.suggestions))
    .bind(&report.scorer_backend)
    .bind(&job_description)
    .fetch_one(&state.db)
    .await?;

    info!(
        "ATS score {}/100 ({}) for resume {}",
        report.overall_score, report.scorer_backend, resume_id
    );
    Ok((StatusCode::CREATED, Json(analysis)))
}

/// GET /api/v1/resumes/:id/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Vec<ResumeAnalysisRow>>, AppError> {
    owned_resume(&state, auth, resume_id).await?;
    let analyses = sqlx::query_as::<_, ResumeAnalysisRow>(
        "SELECT * FROM resume_analyses WHERE resume_id = $1 ORDER BY created_at DESC",
    )
    .bind(resume_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(analyses))
}

/// Loads a resume, hiding other users' resumes behind 404.
async fn owned_resume(state: &AppState, auth: AuthUser, resume_id: Uuid) -> Result<ResumeRow, AppError> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(resume_id)
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))
}
