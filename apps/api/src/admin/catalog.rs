//! Course and program catalog: admin CRUD plus the public published lists.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::validation::require_non_empty;
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::catalog::{CourseRow, ProgramRow};
use crate::state::AppState;

const COURSE_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
const MAX_DURATION_WEEKS: i32 = 104;

#[derive(Debug, Deserialize)]
pub struct CourseInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub provider: String,
    pub level: Option<String>,
    pub duration_weeks: Option<i32>,
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub published: bool,
}

/// Validated course fields, ready to bind.
#[derive(Debug, PartialEq)]
struct CourseFields {
    title: String,
    description: String,
    provider: String,
    level: String,
    duration_weeks: i32,
    price_cents: i64,
    published: bool,
}

impl CourseInput {
    fn validate(self) -> Result<CourseFields, AppError> {
        let level = self
            .level
            .map(|l| l.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "beginner".to_string());
        if !COURSE_LEVELS.contains(&level.as_str()) {
            return Err(AppError::Validation(format!(
                "level must be one of {}",
                COURSE_LEVELS.join(", ")
            )));
        }
        let duration_weeks = self.duration_weeks.unwrap_or(4);
        if !(1..=MAX_DURATION_WEEKS).contains(&duration_weeks) {
            return Err(AppError::Validation(format!(
                "duration_weeks must be between 1 and {MAX_DURATION_WEEKS}"
            )));
        }
        let price_cents = self.price_cents.unwrap_or(0);
        if price_cents < 0 {
            return Err(AppError::Validation("price_cents cannot be negative".to_string()));
        }
        Ok(CourseFields {
            title: require_non_empty("title", &self.title)?,
            description: self.description.trim().to_string(),
            provider: require_non_empty("provider", &self.provider)?,
            level,
            duration_weeks,
            price_cents,
            published: self.published,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProgramInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub college_id: Option<Uuid>,
    pub seats: Option<i32>,
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, PartialEq)]
struct ProgramFields {
    name: String,
    description: String,
    college_id: Option<Uuid>,
    seats: i32,
    start_date: Option<NaiveDate>,
    published: bool,
}

impl ProgramInput {
    fn validate(self) -> Result<ProgramFields, AppError> {
        let seats = self.seats.unwrap_or(0);
        if seats < 0 {
            return Err(AppError::Validation("seats cannot be negative".to_string()));
        }
        Ok(ProgramFields {
            name: require_non_empty("name", &self.name)?,
            description: self.description.trim().to_string(),
            college_id: self.college_id,
            seats,
            start_date: self.start_date,
            published: self.published,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/courses
pub async fn handle_public_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseRow>>, AppError> {
    let courses = sqlx::query_as::<_, CourseRow>(
        "SELECT * FROM courses WHERE published ORDER BY title",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(courses))
}

/// GET /api/v1/programs
pub async fn handle_public_programs(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProgramRow>>, AppError> {
    let programs = sqlx::query_as::<_, ProgramRow>(
        "SELECT * FROM programs WHERE published ORDER BY start_date NULLS LAST, name",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(programs))
}

// ────────────────────────────────────────────────────────────────────────────
// Courses (admin)
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/courses
pub async fn handle_list_courses(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<CourseRow>>, AppError> {
    let courses = sqlx::query_as::<_, CourseRow>("SELECT * FROM courses ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(courses))
}

/// POST /api/v1/admin/courses
pub async fn handle_create_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<CourseInput>,
) -> Result<(StatusCode, Json<CourseRow>), AppError> {
    let c = input.validate()?;
    let course = sqlx::query_as::<_, CourseRow>(
        r#"
        INSERT INTO courses (title, description, provider, level, duration_weeks, price_cents, published)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&c.title)
    .bind(&c.description)
    .bind(&c.provider)
    .bind(&c.level)
    .bind(c.duration_weeks)
    .bind(c.price_cents)
    .bind(c.published)
    .fetch_one(&state.db)
    .await?;
    info!("Created course {}", course.id);
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /api/v1/admin/courses/:id
pub async fn handle_get_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseRow>, AppError> {
    sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Course {id} not found")))
}

/// PUT /api/v1/admin/courses/:id
pub async fn handle_update_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CourseInput>,
) -> Result<Json<CourseRow>, AppError> {
    let c = input.validate()?;
    sqlx::query_as::<_, CourseRow>(
        r#"
        UPDATE courses
        SET title = $2, description = $3, provider = $4, level = $5,
            duration_weeks = $6, price_cents = $7, published = $8, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&c.title)
    .bind(&c.description)
    .bind(&c.provider)
    .bind(&c.level)
    .bind(c.duration_weeks)
    .bind(c.price_cents)
    .bind(c.published)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("Course {id} not found")))
}

/// DELETE /api/v1/admin/courses/:id
pub async fn handle_delete_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "courses", id, "Course").await
}

// ────────────────────────────────────────────────────────────────────────────
// Programs (admin)
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/programs
pub async fn handle_list_programs(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<ProgramRow>>, AppError> {
    let programs =
        sqlx::query_as::<_, ProgramRow>("SELECT * FROM programs ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(programs))
}

/// POST /api/v1/admin/programs
pub async fn handle_create_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<ProgramInput>,
) -> Result<(StatusCode, Json<ProgramRow>), AppError> {
    let p = input.validate()?;
    let program = sqlx::query_as::<_, ProgramRow>(
        r#"
        INSERT INTO programs (name, description, college_id, seats, start_date, published)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.college_id)
    .bind(p.seats)
    .bind(p.start_date)
    .bind(p.published)
    .fetch_one(&state.db)
    .await?;
    info!("Created program {}", program.id);
    Ok((StatusCode::CREATED, Json(program)))
}

/// GET /api/v1/admin/programs/:id
pub async fn handle_get_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgramRow>, AppError> {
    sqlx::query_as::<_, ProgramRow>("SELECT * FROM programs WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Program {id} not found")))
}

/// PUT /api/v1/admin/programs/:id
pub async fn handle_update_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ProgramInput>,
) -> Result<Json<ProgramRow>, AppError> {
    let p = input.validate()?;
    sqlx::query_as::<_, ProgramRow>(
        r#"
        UPDATE programs
        SET name = $2, description = $3, college_id = $4, seats = $5,
            start_date = $6, published = $7, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.college_id)
    .bind(p.seats)
    .bind(p.start_date)
    .bind(p.published)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("Program {id} not found")))
}

/// DELETE /api/v1/admin/programs/:id
pub async fn handle_delete_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "programs", id, "Program").await
}

/// `table` is always one of the catalog table names above, never user input.
async fn delete_by_id(
    state: &AppState,
    table: &'static str,
    id: Uuid,
    label: &str,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("{label} {id} not found")));
    }
    info!("Deleted {} {}", label.to_lowercase(), id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(level: Option<&str>, weeks: Option<i32>, price: Option<i64>) -> CourseInput {
        CourseInput {
            title: " Rust for Backend ".to_string(),
            description: String::new(),
            provider: "Launchpad".to_string(),
            level: level.map(str::to_string),
            duration_weeks: weeks,
            price_cents: price,
            published: true,
        }
    }

    #[test]
    fn test_course_defaults() {
        let fields = course(None, None, None).validate().unwrap();
        assert_eq!(fields.title, "Rust for Backend");
        assert_eq!(fields.level, "beginner");
        assert_eq!(fields.duration_weeks, 4);
        assert_eq!(fields.price_cents, 0);
    }

    #[test]
    fn test_course_rejects_bad_values() {
        assert!(course(Some("expert"), None, None).validate().is_err());
        assert!(course(None, Some(0), None).validate().is_err());
        assert!(course(None, None, Some(-1)).validate().is_err());
        assert_eq!(
            course(Some("ADVANCED"), None, None).validate().unwrap().level,
            "advanced"
        );
    }

    #[test]
    fn test_program_validation() {
        let input = ProgramInput {
            name: "  ".to_string(),
            description: String::new(),
            college_id: None,
            seats: None,
            start_date: None,
            published: false,
        };
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let input = ProgramInput {
            name: "Internship Track".to_string(),
            description: " guided ".to_string(),
            college_id: None,
            seats: Some(-5),
            start_date: None,
            published: false,
        };
        assert!(input.validate().is_err());
    }
}
