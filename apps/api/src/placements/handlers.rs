//! Axum route handlers for college listings, logos and placement records.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::placement::PlacementRow;
use crate::models::user::{CollegeRow, Role};
use crate::placements::spreadsheet::{parse_placements, RowError};
use crate::placements::stats::{compute_stats, PlacementStats};
use crate::state::AppState;
use crate::storage::{self, DOWNLOAD_URL_TTL};

pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_SPREADSHEET_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct LogoResponse {
    pub logo_key: String,
    pub logo_url: String,
}

#[derive(Debug, Serialize)]
pub struct PlacementUploadResponse {
    pub inserted: usize,
    pub errors: Vec<RowError>,
    pub source_key: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Public
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/colleges
pub async fn handle_list_colleges(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollegeRow>>, AppError> {
    let colleges = sqlx::query_as::<_, CollegeRow>("SELECT * FROM colleges ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(colleges))
}

// ────────────────────────────────────────────────────────────────────────────
// College-only
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/colleges/me/logo
pub async fn handle_upload_logo(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<LogoResponse>, AppError> {
    auth.require_role(Role::College)?;

    let upload = storage::read_upload(multipart, "file", MAX_LOGO_BYTES).await?;
    let (ext, content_type) = match upload.extension().as_deref() {
        Some("png") => ("png", "image/png"),
        Some("jpg") | Some("jpeg") => ("jpg", "image/jpeg"),
        Some("webp") => ("webp", "image/webp"),
        _ => {
            return Err(AppError::Validation(
                "Logos must be PNG, JPEG or WebP images".to_string(),
            ))
        }
    };

    let previous: Option<String> =
        sqlx::query_scalar::<_, Option<String>>("SELECT logo_key FROM colleges WHERE user_id = $1")
            .bind(auth.id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("College profile not found".to_string()))?;

    let logo_key = format!("logos/{}/{}.{}", auth.id, Uuid::new_v4(), ext);
    storage::upload_object(
        &state.s3,
        &state.config.s3_bucket,
        &logo_key,
        upload.data,
        content_type,
    )
    .await?;

    sqlx::query("UPDATE colleges SET logo_key = $1 WHERE user_id = $2")
        .bind(&logo_key)
        .bind(auth.id)
        .execute(&state.db)
        .await?;

    // The old object is no longer referenced; failing to remove it is not fatal.
    if let Some(old_key) = previous {
        if let Err(e) = storage::delete_object(&state.s3, &state.config.s3_bucket, &old_key).await {
            warn!("Could not remove previous logo {old_key}: {e}");
        }
    }

    let logo_url =
        storage::presigned_url(&state.s3, &state.config.s3_bucket, &logo_key, DOWNLOAD_URL_TTL)
            .await?;
    info!("Updated logo for college {}", auth.id);
    Ok(Json(LogoResponse { logo_key, logo_url }))
}

/// POST /api/v1/colleges/me/placements
pub async fn handle_upload_placements(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PlacementUploadResponse>), AppError> {
    auth.require_role(Role::College)?;

    let upload = storage::read_upload(multipart, "file", MAX_SPREADSHEET_BYTES).await?;
    let (ext, content_type) = match upload.extension().as_deref() {
        Some("xlsx") => (
            "xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        Some("csv") => ("csv", "text/csv"),
        _ => {
            return Err(AppError::Validation(
                "Placement sheets must be .xlsx or .csv".to_string(),
            ))
        }
    };

    let sheet = parse_placements(&upload.data, ext)?;
    if sheet.records.is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "No valid placement rows found ({} rows rejected)",
            sheet.errors.len()
        )));
    }

    let source_key = format!("placements/{}/{}.{}", auth.id, Uuid::new_v4(), ext);
    storage::upload_object(
        &state.s3,
        &state.config.s3_bucket,
        &source_key,
        upload.data.clone(),
        content_type,
    )
    .await?;

    let mut tx = state.db.begin().await?;
    for record in &sheet.records {
        sqlx::query(
            r#"
            INSERT INTO placements (college_id, student_name, company, role, package_lpa, placement_year)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(auth.id)
        .bind(&record.student_name)
        .bind(&record.company)
        .bind(&record.role)
        .bind(record.package_lpa)
        .bind(record.placement_year)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(
        "Imported {} placements for college {} ({} row errors)",
        sheet.records.len(),
        auth.id,
        sheet.errors.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(PlacementUploadResponse {
            inserted: sheet.records.len(),
            errors: sheet.errors,
            source_key,
        }),
    ))
}

/// GET /api/v1/colleges/me/placements
pub async fn handle_list_placements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PlacementRow>>, AppError> {
    auth.require_role(Role::College)?;
    Ok(Json(college_placements(&state, auth.id).await?))
}

/// GET /api/v1/colleges/me/placements/stats
pub async fn handle_placement_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PlacementStats>, AppError> {
    auth.require_role(Role::College)?;
    let rows = college_placements(&state, auth.id).await?;
    Ok(Json(compute_stats(&rows)))
}

async fn college_placements(state: &AppState, college_id: Uuid) -> Result<Vec<PlacementRow>, AppError> {
    let rows = sqlx::query_as::<_, PlacementRow>(
        "SELECT * FROM placements WHERE college_id = $1 ORDER BY created_at DESC",
    )
    .bind(college_id)
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}
