//! Axum route handlers for career plans, task completion and the leaderboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::accounts::repo::load_profile;
use crate::auth::validation::require_non_empty;
use crate::auth::AuthUser;
use crate::career::gamification::{apply_completion, CompletionOutcome};
use crate::career::leaderboard::{clamp_limit, rank_entries, LeaderboardEntry};
use crate::career::plan::{normalize_plan, GeneratedPlan, PlanDraft};
use crate::career::prompts::{build_plan_prompt, plan_system, PlanContext};
use crate::errors::AppError;
use crate::models::career::{
    CareerMilestoneRow, CareerPlanRow, CareerProgressRow, CareerTaskRow, LeaderboardRow,
};
use crate::models::user::{Profile, Role};
use crate::state::AppState;

const DEFAULT_TIMEFRAME_WEEKS: u32 = 12;
const MAX_TIMEFRAME_WEEKS: u32 = 104;

/// Serializes completions within one milestone so the last task sees its siblings.
const LOCK_MILESTONE_SQL: &str =
    "SELECT completed_at IS NOT NULL FROM career_milestones WHERE id = $1 FOR UPDATE";
const REMAINING_TASKS_SQL: &str =
    "SELECT COUNT(*) FROM career_tasks WHERE milestone_id = $1 AND completed_at IS NULL";

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub goal: String,
    pub timeframe_weeks: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MilestoneView {
    #[serde(flatten)]
    pub milestone: CareerMilestoneRow,
    pub tasks: Vec<CareerTaskRow>,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    pub plan: CareerPlanRow,
    pub milestones: Vec<MilestoneView>,
    pub progress: CareerProgressRow,
}

#[derive(Debug, Serialize)]
pub struct CompleteTaskResponse {
    pub task_id: Uuid,
    #[serde(flatten)]
    pub outcome: CompletionOutcome,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub college_id: Option<Uuid>,
    pub limit: Option<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Plans
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/career/plans
pub async fn handle_create_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanView>), AppError> {
    auth.require_any(&[Role::Student, Role::Professional])?;

    let goal = require_non_empty("goal", &req.goal)?;
    let weeks = req.timeframe_weeks.unwrap_or(DEFAULT_TIMEFRAME_WEEKS);
    if !(1..=MAX_TIMEFRAME_WEEKS).contains(&weeks) {
        return Err(AppError::Validation(format!(
            "timeframe_weeks must be between 1 and {MAX_TIMEFRAME_WEEKS}"
        )));
    }

    let ctx = plan_context(&state, auth).await?;
    let prompt = build_plan_prompt(&goal, weeks, &ctx);
    let generated = match state
        .llm
        .call_json::<GeneratedPlan>(&prompt, &plan_system())
        .await
    {
        Ok(plan) => plan,
        Err(e) => {
            warn!("Plan generation failed for user {}, using default roadmap: {e}", auth.id);
            GeneratedPlan::default()
        }
    };
    let draft = normalize_plan(generated, &goal);

    let mut tx = state.db.begin().await?;
    sqlx::query("UPDATE career_plans SET status = 'archived' WHERE user_id = $1 AND status = 'active'")
        .bind(auth.id)
        .execute(&mut *tx)
        .await?;
    let (plan, milestones) = insert_plan(&mut tx, auth.id, &goal, &draft).await?;
    tx.commit().await?;

    let progress = load_progress(&state, auth.id).await?;
    info!(
        "Created career plan {} with {} milestones for user {}",
        plan.id,
        milestones.len(),
        auth.id
    );
    Ok((
        StatusCode::CREATED,
        Json(PlanView {
            plan,
            milestones,
            progress,
        }),
    ))
}

/// GET /api/v1/career/plans/current
pub async fn handle_current_plan(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PlanView>, AppError> {
    let plan = sqlx::query_as::<_, CareerPlanRow>(
        "SELECT * FROM career_plans WHERE user_id = $1 AND status = 'active'",
    )
    .bind(auth.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("No active career plan".to_string()))?;

    let milestones = sqlx::query_as::<_, CareerMilestoneRow>(
        "SELECT * FROM career_milestones WHERE plan_id = $1 ORDER BY position",
    )
    .bind(plan.id)
    .fetch_all(&state.db)
    .await?;
    let tasks = sqlx::query_as::<_, CareerTaskRow>(
        "SELECT * FROM career_tasks WHERE plan_id = $1 ORDER BY position",
    )
    .bind(plan.id)
    .fetch_all(&state.db)
    .await?;

    let progress = load_progress(&state, auth.id).await?;
    Ok(Json(PlanView {
        plan,
        milestones: group_tasks(milestones, tasks),
        progress,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Progress
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/career/tasks/:id/complete
pub async fn handle_complete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<CompleteTaskResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    let task = sqlx::query_as::<_, CareerTaskRow>(
        r#"
        SELECT t.* FROM career_tasks t
        JOIN career_plans p ON p.id = t.plan_id
        WHERE t.id = $1 AND p.user_id = $2
        FOR UPDATE OF t
        "#,
    )
    .bind(task_id)
    .bind(auth.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))?;

    if task.completed_at.is_some() {
        return Err(AppError::Conflict("Task is already complete".to_string()));
    }

    let milestone_done: bool = sqlx::query_scalar(LOCK_MILESTONE_SQL)
        .bind(task.milestone_id)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("UPDATE career_tasks SET completed_at = now() WHERE id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    let remaining: i64 = sqlx::query_scalar(REMAINING_TASKS_SQL)
        .bind(task.milestone_id)
        .fetch_one(&mut *tx)
        .await?;
    let milestone_completed = if remaining == 0 && !milestone_done {
        sqlx::query(
            "UPDATE career_milestones SET completed_at = now() WHERE id = $1 AND completed_at IS NULL",
        )
        .bind(task.milestone_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1
    } else {
        false
    };

    // Make sure a row exists, then lock it so concurrent completions serialize.
    sqlx::query("INSERT INTO career_progress (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(auth.id)
        .execute(&mut *tx)
        .await?;
    let progress = sqlx::query_as::<_, CareerProgressRow>(
        "SELECT * FROM career_progress WHERE user_id = $1 FOR UPDATE",
    )
    .bind(auth.id)
    .fetch_one(&mut *tx)
    .await?;

    let today = Utc::now().date_naive();
    let (updated, outcome) = apply_completion(&progress, task.xp_reward, milestone_completed, today);

    sqlx::query(
        r#"
        UPDATE career_progress
        SET xp = $2, level = $3, current_streak = $4, longest_streak = $5, last_active_date = $6
        WHERE user_id = $1
        "#,
    )
    .bind(auth.id)
    .bind(updated.xp)
    .bind(updated.level)
    .bind(updated.current_streak)
    .bind(updated.longest_streak)
    .bind(updated.last_active_date)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "User {} completed task {} (+{} XP, level {})",
        auth.id, task_id, outcome.xp_gained, outcome.level
    );
    Ok(Json(CompleteTaskResponse { task_id, outcome }))
}

/// GET /api/v1/career/progress
pub async fn handle_get_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CareerProgressRow>, AppError> {
    Ok(Json(load_progress(&state, auth.id).await?))
}

/// GET /api/v1/career/leaderboard
pub async fn handle_leaderboard(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let limit = clamp_limit(query.limit);
    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT p.user_id, u.name, p.xp, p.level, p.longest_streak
        FROM career_progress p
        JOIN users u ON u.id = p.user_id
        LEFT JOIN students s ON s.user_id = p.user_id
        WHERE $1::uuid IS NULL OR s.college_id = $1
        ORDER BY p.xp DESC, p.longest_streak DESC, u.name ASC
        LIMIT $2
        "#,
    )
    .bind(query.college_id)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rank_entries(rows)))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn plan_context(state: &AppState, auth: AuthUser) -> Result<PlanContext, AppError> {
    let mut ctx = PlanContext {
        role: auth.role.to_string(),
        ..Default::default()
    };
    match load_profile(&state.db, auth.id, auth.role).await? {
        Profile::Student(student) => {
            ctx.skills = student.skills.0;
            ctx.interests = student.interests.0;
            ctx.quiz_answers = student.quiz_answers.0;
        }
        Profile::Professional(professional) => {
            ctx.skills = professional.skills.0;
        }
        Profile::College(_) | Profile::Admin => {}
    }
    Ok(ctx)
}

async fn load_progress(state: &AppState, user_id: Uuid) -> Result<CareerProgressRow, AppError> {
    let progress =
        sqlx::query_as::<_, CareerProgressRow>("SELECT * FROM career_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?
            .unwrap_or_else(|| CareerProgressRow::empty(user_id));
    Ok(progress)
}

async fn insert_plan(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    goal: &str,
    draft: &PlanDraft,
) -> Result<(CareerPlanRow, Vec<MilestoneView>), AppError> {
    let plan = sqlx::query_as::<_, CareerPlanRow>(
        "INSERT INTO career_plans (user_id, goal, summary) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(goal)
    .bind(&draft.summary)
    .fetch_one(&mut **tx)
    .await?;

    let mut views = Vec::with_capacity(draft.milestones.len());
    for (m_idx, milestone) in draft.milestones.iter().enumerate() {
        let row = sqlx::query_as::<_, CareerMilestoneRow>(
            r#"
            INSERT INTO career_milestones (plan_id, position, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(plan.id)
        .bind(m_idx as i32)
        .bind(&milestone.title)
        .bind(&milestone.description)
        .fetch_one(&mut **tx)
        .await?;

        let mut tasks = Vec::with_capacity(milestone.tasks.len());
        for (t_idx, task) in milestone.tasks.iter().enumerate() {
            let task_row = sqlx::query_as::<_, CareerTaskRow>(
                r#"
                INSERT INTO career_tasks
                    (plan_id, milestone_id, position, title, description, difficulty, xp_reward)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(plan.id)
            .bind(row.id)
            .bind(t_idx as i32)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.difficulty.as_str())
            .bind(task.xp_reward())
            .fetch_one(&mut **tx)
            .await?;
            tasks.push(task_row);
        }
        views.push(MilestoneView {
            milestone: row,
            tasks,
        });
    }
    Ok((plan, views))
}

fn group_tasks(milestones: Vec<CareerMilestoneRow>, tasks: Vec<CareerTaskRow>) -> Vec<MilestoneView> {
    let mut views: Vec<MilestoneView> = milestones
        .into_iter()
        .map(|milestone| MilestoneView {
            milestone,
            tasks: Vec::new(),
        })
        .collect();
    for task in tasks {
        if let Some(view) = views.iter_mut().find(|v| v.milestone.id == task.milestone_id) {
            view.tasks.push(task);
        }
    }
    views
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_row_is_locked_before_counting() {
        assert!(LOCK_MILESTONE_SQL.contains("FROM career_milestones"));
        assert!(LOCK_MILESTONE_SQL.trim_end().ends_with("FOR UPDATE"));
        assert!(REMAINING_TASKS_SQL.contains("completed_at IS NULL"));
    }
}
