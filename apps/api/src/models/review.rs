use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
