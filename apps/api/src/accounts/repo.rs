//! Queries shared by the auth and settings handlers.

use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{CollegeRow, Profile, ProfessionalRow, Role, StudentRow, UserRow};

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, AppError> {
    Ok(
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<UserRow, AppError> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, AppError> {
    Ok(
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?,
    )
}

/// Fields a new account may carry for its role profile.
#[derive(Debug, Default, Clone)]
pub struct NewProfile {
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

pub async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    password_hash: &str,
    role: Role,
    name: &str,
) -> Result<UserRow, AppError> {
    Ok(sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (email, password_hash, role, name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(name)
    .fetch_one(&mut **tx)
    .await?)
}

/// Creates the role-specific profile row in the registration transaction.
pub async fn insert_profile(
    tx: &mut Transaction<'_, Postgres>,
    user: &UserRow,
    role: Role,
    profile: &NewProfile,
) -> Result<(), AppError> {
    match role {
        Role::College => {
            let name = profile
                .college_name
                .clone()
                .unwrap_or_else(|| user.name.clone());
            sqlx::query(
                "INSERT INTO colleges (user_id, name, website, location) VALUES ($1, $2, $3, $4)",
            )
            .bind(user.id)
            .bind(name)
            .bind(&profile.website)
            .bind(&profile.location)
            .execute(&mut **tx)
            .await?;
        }
        Role::Student => {
            sqlx::query(
                "INSERT INTO students (user_id, college_id, major, graduation_year) VALUES ($1, $2, $3, $4)",
            )
            .bind(user.id)
            .bind(profile.college_id)
            .bind(&profile.major)
            .bind(profile.graduation_year)
            .execute(&mut **tx)
            .await?;
        }
        Role::Professional => {
            sqlx::query(
                "INSERT INTO professionals (user_id, headline, company, years_experience) VALUES ($1, $2, $3, $4)",
            )
            .bind(user.id)
            .bind(&profile.headline)
            .bind(&profile.company)
            .bind(profile.years_experience)
            .execute(&mut **tx)
            .await?;
        }
        Role::Admin => {}
    }
    Ok(())
}

/// Records a signup against an affiliate code. Unknown codes are a client error.
pub async fn record_referral(
    tx: &mut Transaction<'_, Postgres>,
    code: &str,
    user_id: Uuid,
) -> Result<(), AppError> {
    let code = code.trim().to_uppercase();
    let affiliate_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM affiliates WHERE code = $1")
        .bind(&code)
        .fetch_optional(&mut **tx)
        .await?;
    let affiliate_id =
        affiliate_id.ok_or_else(|| AppError::Validation(format!("Unknown referral code '{code}'")))?;

    sqlx::query("INSERT INTO affiliate_referrals (affiliate_id, referred_user_id) VALUES ($1, $2)")
        .bind(affiliate_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn load_profile(pool: &PgPool, user_id: Uuid, role: Role) -> Result<Profile, AppError> {
    let profile = match role {
        Role::Student => Profile::Student(
            sqlx::query_as::<_, StudentRow>("SELECT * FROM students WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .unwrap_or_else(|| empty_student(user_id)),
        ),
        Role::College => Profile::College(
            sqlx::query_as::<_, CollegeRow>("SELECT * FROM colleges WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| AppError::NotFound("College profile not found".to_string()))?,
        ),
        Role::Professional => Profile::Professional(
            sqlx::query_as::<_, ProfessionalRow>("SELECT * FROM professionals WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .unwrap_or_else(|| empty_professional(user_id)),
        ),
        Role::Admin => Profile::Admin,
    };
    Ok(profile)
}

fn empty_student(user_id: Uuid) -> StudentRow {
    StudentRow {
        user_id,
        college_id: None,
        major: None,
        graduation_year: None,
        skills: Json(vec![]),
        interests: Json(vec![]),
        quiz_answers: Json(Value::Object(Default::default())),
    }
}

fn empty_professional(user_id: Uuid) -> ProfessionalRow {
    ProfessionalRow {
        user_id,
        headline: None,
        company: None,
        years_experience: None,
        skills: Json(vec![]),
    }
}

pub async fn update_password_hash(pool: &PgPool, user_id: Uuid, hash: &str) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }
    Ok(())
}
