use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub provider: String,
    pub level: String,
    pub duration_weeks: i32,
    pub price_cents: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgramRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub college_id: Option<Uuid>,
    pub seats: i32,
    pub start_date: Option<NaiveDate>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub audience: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Notification as seen by a recipient, with their read receipt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InboxNotificationRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub audience: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AffiliateRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub code: String,
    pub commission_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralRow {
    pub affiliate_id: Uuid,
    pub converted: bool,
    pub commission_cents: i64,
}
