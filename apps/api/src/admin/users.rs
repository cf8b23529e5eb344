//! Admin user management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::user::{PublicUser, Role, UserRow};
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<PublicUser>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// 1-based page and a clamped page size.
pub fn page_window(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

/// Row offset for a page; saturates rather than overflowing on huge pages.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page - 1).saturating_mul(per_page)
}

/// GET /api/v1/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserPage>, AppError> {
    let role = query
        .role
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|r| r.parse::<Role>().map_err(AppError::Validation))
        .transpose()?;
    let role = role.map(|r| r.as_str());
    let (page, per_page) = page_window(query.page, query.per_page);

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE $1::text IS NULL OR role = $1")
            .bind(role)
            .fetch_one(&state.db)
            .await?;
    let users = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT * FROM users
        WHERE $1::text IS NULL OR role = $1
        ORDER BY created_at DESC, id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(role)
    .bind(per_page)
    .bind(page_offset(page, per_page))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(UserPage {
        users: users.into_iter().map(PublicUser::from).collect(),
        page,
        per_page,
        total,
    }))
}

/// DELETE /api/v1/admin/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if user_id == admin.id {
        return Err(AppError::Validation(
            "Admins cannot delete their own account here".to_string(),
        ));
    }
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }
    info!("Admin {} deleted user {}", admin.id, user_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (1, 20));
        assert_eq!(page_window(Some(0), Some(0)), (1, 1));
        assert_eq!(page_window(Some(-3), Some(1_000)), (1, 100));
        assert_eq!(page_window(Some(4), Some(25)), (4, 25));
    }

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 25), 50);
        let (page, per_page) = page_window(Some(i64::MAX), Some(100));
        assert_eq!(page_offset(page, per_page), i64::MAX);
    }
}
