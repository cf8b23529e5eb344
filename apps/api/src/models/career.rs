use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CareerPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal: String,
    pub summary: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CareerMilestoneRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CareerTaskRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub milestone_id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub xp_reward: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct CareerProgressRow {
    pub user_id: Uuid,
    pub xp: i64,
    pub level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_date: Option<NaiveDate>,
}

impl CareerProgressRow {
    /// Progress for a user who has not completed anything yet.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            level: 1,
            ..Default::default()
        }
    }
}

/// Leaderboard source row: progress joined with the user's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub name: String,
    pub xp: i64,
    pub level: i32,
    pub longest_streak: i32,
}
