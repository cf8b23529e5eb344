pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::admin::{affiliates, catalog, notifications, users};
use crate::auth::handlers as auth;
use crate::auth::rate_limit::rate_limit;
use crate::career::handlers as career;
use crate::chat::handlers as chat;
use crate::placements::handlers as colleges;
use crate::resumes::handlers as resumes;
use crate::skills::handlers as skills;
use crate::state::AppState;

/// Largest accepted request body. Per-route file caps are enforced by `storage::read_upload`.
const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Credential endpoints are throttled per (route, client ip).
    let throttled = Router::new()
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route(
            "/api/v1/auth/forgot-password",
            post(auth::handle_forgot_password),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(throttled)
        // Auth
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        .route(
            "/api/v1/auth/reset-password",
            post(auth::handle_reset_password),
        )
        // Account settings
        .route(
            "/api/v1/me/profile",
            get(accounts::handle_get_profile).put(accounts::handle_update_profile),
        )
        .route("/api/v1/me/password", put(accounts::handle_change_password))
        .route("/api/v1/me", delete(accounts::handle_delete_account))
        // Colleges & placements
        .route("/api/v1/colleges", get(colleges::handle_list_colleges))
        .route("/api/v1/colleges/me/logo", post(colleges::handle_upload_logo))
        .route(
            "/api/v1/colleges/me/placements",
            get(colleges::handle_list_placements).post(colleges::handle_upload_placements),
        )
        .route(
            "/api/v1/colleges/me/placements/stats",
            get(colleges::handle_placement_stats),
        )
        // Resumes & ATS
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_upload_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume).delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/analyze",
            post(resumes::handle_analyze_resume),
        )
        .route(
            "/api/v1/resumes/:id/analyses",
            get(resumes::handle_list_analyses),
        )
        // Career plans & gamification
        .route("/api/v1/career/plans", post(career::handle_create_plan))
        .route(
            "/api/v1/career/plans/current",
            get(career::handle_current_plan),
        )
        .route(
            "/api/v1/career/tasks/:id/complete",
            post(career::handle_complete_task),
        )
        .route("/api/v1/career/leaderboard", get(career::handle_leaderboard))
        .route("/api/v1/career/progress", get(career::handle_get_progress))
        // Professionals
        .route(
            "/api/v1/professionals/me/skills/extract",
            post(skills::handle_extract_skills),
        )
        .route(
            "/api/v1/professionals/:id/reviews",
            post(skills::handle_create_review),
        )
        // Chat
        .route(
            "/api/v1/chat/conversations",
            get(chat::handle_list_conversations).post(chat::handle_create_conversation),
        )
        .route(
            "/api/v1/chat/conversations/:id/messages",
            get(chat::handle_list_messages).post(chat::handle_send_message),
        )
        // Public catalog & inbox
        .route("/api/v1/courses", get(catalog::handle_public_courses))
        .route("/api/v1/programs", get(catalog::handle_public_programs))
        .route("/api/v1/notifications", get(notifications::handle_inbox))
        .route(
            "/api/v1/notifications/:id/read",
            post(notifications::handle_mark_read),
        )
        // Admin dashboards
        .route(
            "/api/v1/admin/courses",
            get(catalog::handle_list_courses).post(catalog::handle_create_course),
        )
        .route(
            "/api/v1/admin/courses/:id",
            get(catalog::handle_get_course)
                .put(catalog::handle_update_course)
                .delete(catalog::handle_delete_course),
        )
        .route(
            "/api/v1/admin/programs",
            get(catalog::handle_list_programs).post(catalog::handle_create_program),
        )
        .route(
            "/api/v1/admin/programs/:id",
            get(catalog::handle_get_program)
                .put(catalog::handle_update_program)
                .delete(catalog::handle_delete_program),
        )
        .route("/api/v1/admin/users", get(users::handle_list_users))
        .route("/api/v1/admin/users/:id", delete(users::handle_delete_user))
        .route(
            "/api/v1/admin/notifications",
            get(notifications::handle_list_notifications)
                .post(notifications::handle_create_notification),
        )
        .route(
            "/api/v1/admin/notifications/:id",
            delete(notifications::handle_delete_notification),
        )
        .route(
            "/api/v1/admin/affiliates/stats",
            get(affiliates::handle_affiliate_stats),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
