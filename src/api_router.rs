//! Central API router.
//!
//! Combines the per-resource routers into one surface. Everything except
//! login and registration sits behind the bearer-token middleware, which
//! resolves the current user before any handler runs.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;

use crate::auth;
use crate::dashboard;
use crate::departments;
use crate::goals;
use crate::next_actions;
use crate::one_on_ones;
use crate::shared::state::AppState;
use crate::users;

pub fn configure_api_routes(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        // ===== Users & Departments =====
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/api/users/supervisors", get(users::list_supervisors))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        // ===== Goals / OKR =====
        .route(
            "/api/goals",
            get(goals::list_goals).post(goals::create_goal),
        )
        .route(
            "/api/goals/{id}",
            get(goals::get_goal)
                .put(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route("/api/goals/{id}/approve", patch(goals::approve_goal))
        .route("/api/goals/{id}/progress", patch(goals::update_progress))
        // ===== One-on-ones =====
        .route(
            "/api/one-on-ones",
            get(one_on_ones::list_one_on_ones).post(one_on_ones::create_one_on_one),
        )
        .route(
            "/api/one-on-ones/templates",
            get(one_on_ones::templates::list_templates),
        )
        .route(
            "/api/one-on-ones/{id}",
            get(one_on_ones::get_one_on_one)
                .put(one_on_ones::update_one_on_one)
                .delete(one_on_ones::cancel_one_on_one),
        )
        .route(
            "/api/one-on-ones/{id}/agendas",
            get(one_on_ones::agendas::list_agendas).post(one_on_ones::agendas::create_agenda),
        )
        .route(
            "/api/one-on-ones/{id}/minutes",
            get(one_on_ones::minutes::list_minutes).post(one_on_ones::minutes::create_minute),
        )
        .route(
            "/api/one-on-ones/{id}/next-actions",
            get(next_actions::list_for_meeting).post(next_actions::create_for_meeting),
        )
        // ===== Next actions (cross-meeting) =====
        .route("/api/actions", get(next_actions::list_actions))
        .route("/api/actions/stats", get(next_actions::action_stats))
        .route(
            "/api/actions/{id}",
            get(next_actions::get_action)
                .put(next_actions::update_action)
                .delete(next_actions::delete_action),
        )
        // ===== Dashboard =====
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    public.merge(protected).with_state(state)
}
