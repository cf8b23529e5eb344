use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Account role. Stored as lowercase TEXT and carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    College,
    Professional,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::College => "college",
            Role::Professional => "professional",
            Role::Admin => "admin",
        }
    }

    /// Roles a visitor may pick on the registration form.
    pub fn is_self_registrable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "college" => Ok(Role::College),
            "professional" => Ok(Role::Professional),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as returned to clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            role: row.role,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CollegeRow {
    pub user_id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentRow {
    pub user_id: Uuid,
    pub college_id: Option<Uuid>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub skills: Json<Vec<String>>,
    pub interests: Json<Vec<String>>,
    pub quiz_answers: Json<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfessionalRow {
    pub user_id: Uuid,
    pub headline: Option<String>,
    pub company: Option<String>,
    pub years_experience: Option<i32>,
    pub skills: Json<Vec<String>>,
}

/// Role-specific profile attached to a user.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
    Student(StudentRow),
    College(CollegeRow),
    Professional(ProfessionalRow),
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!("Student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!(" COLLEGE ".parse::<Role>().unwrap(), Role::College);
        assert!("recruiter".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_not_self_registrable() {
        assert!(!Role::Admin.is_self_registrable());
        assert!(Role::Professional.is_self_registrable());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Professional).unwrap(), "\"professional\"");
    }
}
