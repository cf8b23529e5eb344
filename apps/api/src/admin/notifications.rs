//! Admin broadcasts and the per-user notification inbox.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::validation::require_non_empty;
use crate::auth::{AdminUser, AuthUser};
use crate::errors::AppError;
use crate::models::catalog::{InboxNotificationRow, NotificationRow};
use crate::models::user::Role;
use crate::state::AppState;

pub const AUDIENCE_ALL: &str = "all";
const MAX_TITLE_CHARS: usize = 200;
const MAX_BODY_CHARS: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub body: String,
    pub audience: Option<String>,
}

/// "all" or a role name, lowercased. Missing means everyone.
pub fn parse_audience(raw: Option<&str>) -> Result<String, AppError> {
    match raw.map(str::trim).filter(|a| !a.is_empty()) {
        None => Ok(AUDIENCE_ALL.to_string()),
        Some(a) if a.eq_ignore_ascii_case(AUDIENCE_ALL) => Ok(AUDIENCE_ALL.to_string()),
        Some(a) => a
            .parse::<Role>()
            .map(|r| r.as_str().to_string())
            .map_err(|_| AppError::Validation(format!("Unknown audience '{a}'"))),
    }
}

/// POST /api/v1/admin/notifications
pub async fn handle_create_notification(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<NotificationRow>), AppError> {
    let title = require_non_empty("title", &req.title)?;
    let body = require_non_empty("body", &req.body)?;
    if title.chars().count() > MAX_TITLE_CHARS || body.chars().count() > MAX_BODY_CHARS {
        return Err(AppError::Validation(format!(
            "title is limited to {MAX_TITLE_CHARS} and body to {MAX_BODY_CHARS} characters"
        )));
    }
    let audience = parse_audience(req.audience.as_deref())?;

    let notification = sqlx::query_as::<_, NotificationRow>(
        r#"
        INSERT INTO notifications (title, body, audience, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&body)
    .bind(&audience)
    .bind(admin.id)
    .fetch_one(&state.db)
    .await?;
    info!("Notification {} sent to '{}'", notification.id, audience);
    Ok((StatusCode::CREATED, Json(notification)))
}

/// GET /api/v1/admin/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    let notifications =
        sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(notifications))
}

/// DELETE /api/v1/admin/notifications/:id
pub async fn handle_delete_notification(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Inbox
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/notifications
pub async fn handle_inbox(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InboxNotificationRow>>, AppError> {
    let inbox = sqlx::query_as::<_, InboxNotificationRow>(
        r#"
        SELECT n.id, n.title, n.body, n.audience, n.created_at,
               (r.user_id IS NOT NULL) AS read
        FROM notifications n
        LEFT JOIN notification_reads r ON r.notification_id = n.id AND r.user_id = $1
        WHERE n.audience = 'all' OR n.audience = $2
        ORDER BY n.created_at DESC
        "#,
    )
    .bind(auth.id)
    .bind(auth.role.as_str())
    .fetch_all(&state.db)
    .await?;
    Ok(Json(inbox))
}

/// POST /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let visible: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM notifications WHERE id = $1 AND (audience = 'all' OR audience = $2)",
    )
    .bind(id)
    .bind(auth.role.as_str())
    .fetch_optional(&state.db)
    .await?;
    if visible.is_none() {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }

    sqlx::query(
        r#"
        INSERT INTO notification_reads (notification_id, user_id) VALUES ($1, $2)
        ON CONFLICT (notification_id, user_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(auth.id)
    .execute(&state.db)
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audience() {
        assert_eq!(parse_audience(None).unwrap(), "all");
        assert_eq!(parse_audience(Some("  ")).unwrap(), "all");
        assert_eq!(parse_audience(Some("ALL")).unwrap(), "all");
        assert_eq!(parse_audience(Some("Student")).unwrap(), "student");
        assert!(matches!(
            parse_audience(Some("alumni")),
            Err(AppError::Validation(_))
        ));
    }
}
