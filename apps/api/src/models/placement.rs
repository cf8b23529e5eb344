use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlacementRow {
    pub id: Uuid,
    pub college_id: Uuid,
    pub student_name: String,
    pub company: String,
    pub role: Option<String>,
    pub package_lpa: Option<f64>,
    pub placement_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}
