pub mod progress;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::permissions::{can_access_owned, can_approve_goal};
use crate::shared::error::ApiError;
use crate::shared::models::{Goal, KeyResult, User};
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;
use crate::users::UserSummary;

pub use progress::goal_progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Draft,
    PendingApproval,
    Rejected,
    Active,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(Self::Draft),
            "PENDING_APPROVAL" => Some(Self::PendingApproval),
            "REJECTED" => Some(Self::Rejected),
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Rejected => "REJECTED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingApproval => "Pending approval",
            Self::Rejected => "Rejected",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

// ===== Request/Response Structures =====

#[derive(Debug, Deserialize)]
pub struct GoalQuery {
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct KeyResultInput {
    pub title: String,
    pub target_value: f64,
    pub current_value: Option<f64>,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    pub description: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub key_results: Option<Vec<KeyResultInput>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub key_results: Option<Vec<KeyResultInput>>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveGoalRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyResultProgressInput {
    pub id: Uuid,
    pub current_value: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub key_results: Vec<KeyResultProgressInput>,
}

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub progress: i32,
    pub key_results: Vec<KeyResult>,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_response(goal: Goal, key_results: Vec<KeyResult>, owner: &User) -> GoalResponse {
    let progress = goal_progress(&key_results);
    GoalResponse {
        id: goal.id,
        user_id: goal.user_id,
        title: goal.title,
        description: goal.description,
        start_date: goal.start_date,
        end_date: goal.end_date,
        status: goal.status,
        progress,
        key_results,
        user: UserSummary::from(owner),
        created_at: goal.created_at,
        updated_at: goal.updated_at,
    }
}

#[derive(Debug, Serialize)]
pub struct GoalMessageResponse {
    pub message: String,
    pub goal: GoalResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ===== API Handlers =====

/// GET /api/goals - own goals by default; someone else's need MANAGER+
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<GoalQuery>,
) -> Result<Json<Vec<GoalResponse>>, ApiError> {
    let target_user = params.user_id.unwrap_or(current.id);
    if !can_access_owned(current.role, current.id, target_user) {
        return Err(ApiError::forbidden(
            "you do not have permission to view these goals",
        ));
    }
    if let Some(status) = params.status.as_deref() {
        GoalStatus::parse(status)
            .ok_or_else(|| ApiError::validation(format!("unknown goal status: {}", status)))?;
    }

    let responses = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{goals, key_results, users};

        let mut query = goals::table
            .filter(goals::user_id.eq(target_user))
            .into_boxed();
        if let Some(status) = params.status {
            query = query.filter(goals::status.eq(status));
        }
        let rows = query.order(goals::created_at.desc()).load::<Goal>(conn)?;

        let owner = users::table
            .find(target_user)
            .first::<User>(conn)
            .optional()?
            .ok_or(ApiError::NotFound("user"))?;

        let goal_ids: Vec<Uuid> = rows.iter().map(|g| g.id).collect();
        let all_key_results = key_results::table
            .filter(key_results::goal_id.eq_any(&goal_ids))
            .order(key_results::created_at.asc())
            .load::<KeyResult>(conn)?;
        let mut by_goal: std::collections::HashMap<Uuid, Vec<KeyResult>> =
            std::collections::HashMap::new();
        for kr in all_key_results {
            by_goal.entry(kr.goal_id).or_default().push(kr);
        }

        let responses = rows
            .into_iter()
            .map(|goal| {
                let krs = by_goal.remove(&goal.id).unwrap_or_default();
                to_response(goal, krs, &owner)
            })
            .collect();
        Ok(responses)
    })
    .await?;

    Ok(Json(responses))
}

/// POST /api/goals - create a goal for the caller
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<GoalResponse>), ApiError> {
    let (start_date, end_date) = match (req.start_date, req.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ApiError::validation(
                "title, description, start date and end date are required",
            ))
        }
    };
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(ApiError::validation(
            "title, description, start date and end date are required",
        ));
    }
    let status = match req.status.as_deref() {
        Some(value) => GoalStatus::parse(value)
            .ok_or_else(|| ApiError::validation(format!("unknown goal status: {}", value)))?,
        None => GoalStatus::Draft,
    };

    let now = Utc::now();
    let goal = Goal {
        id: Uuid::new_v4(),
        user_id: current.id,
        title: req.title.trim().to_string(),
        description: req.description,
        start_date,
        end_date,
        status: status.as_str().to_string(),
        created_at: now,
        updated_at: now,
    };
    let new_key_results = build_key_results(goal.id, req.key_results.unwrap_or_default(), now);

    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{goals, key_results, users};
        let created = diesel::insert_into(goals::table)
            .values(&goal)
            .get_result::<Goal>(conn)?;
        let krs = diesel::insert_into(key_results::table)
            .values(&new_key_results)
            .get_results::<KeyResult>(conn)?;
        let owner = users::table.find(created.user_id).first::<User>(conn)?;
        Ok(to_response(created, krs, &owner))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/goals/{id} - owner or MANAGER+
pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalResponse>, ApiError> {
    let response = with_conn(&state.conn, move |conn| load_goal_response(conn, goal_id)).await?;

    if !can_access_owned(current.role, current.id, response.user_id) {
        return Err(ApiError::forbidden(
            "you do not have permission to view this goal",
        ));
    }
    Ok(Json(response))
}

/// PUT /api/goals/{id} - owner only; replaces key results when supplied
pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<Json<GoalResponse>, ApiError> {
    let mut goal = load_goal(&state, goal_id).await?;
    if goal.user_id != current.id {
        return Err(ApiError::forbidden(
            "you do not have permission to edit this goal",
        ));
    }

    if let Some(title) = req.title {
        if !title.trim().is_empty() {
            goal.title = title.trim().to_string();
        }
    }
    if let Some(description) = req.description {
        goal.description = description;
    }
    if let Some(start_date) = req.start_date {
        goal.start_date = start_date;
    }
    if let Some(end_date) = req.end_date {
        goal.end_date = end_date;
    }
    if let Some(status) = req.status {
        let parsed = GoalStatus::parse(&status)
            .ok_or_else(|| ApiError::validation(format!("unknown goal status: {}", status)))?;
        goal.status = parsed.as_str().to_string();
    }
    goal.updated_at = Utc::now();

    let replacement = req
        .key_results
        .map(|inputs| build_key_results(goal_id, inputs, goal.updated_at));

    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{goals, key_results};
        diesel::update(goals::table.find(goal.id))
            .set(&goal)
            .execute(conn)?;
        if let Some(new_key_results) = replacement {
            diesel::delete(key_results::table.filter(key_results::goal_id.eq(goal_id)))
                .execute(conn)?;
            diesel::insert_into(key_results::table)
                .values(&new_key_results)
                .execute(conn)?;
        }
        load_goal_response(conn, goal_id)
    })
    .await?;

    Ok(Json(response))
}

/// DELETE /api/goals/{id} - owner only; key results cascade with the goal
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let goal = load_goal(&state, goal_id).await?;
    if goal.user_id != current.id {
        return Err(ApiError::forbidden(
            "you do not have permission to delete this goal",
        ));
    }

    with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::goals::dsl::*;
        diesel::delete(goals.find(goal_id)).execute(conn)?;
        Ok(())
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "goal deleted".to_string(),
    }))
}

/// PATCH /api/goals/{id}/approve - MANAGER+ decides on a pending goal
pub async fn approve_goal(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<ApproveGoalRequest>,
) -> Result<Json<GoalMessageResponse>, ApiError> {
    let decision = GoalStatus::parse(&req.status)
        .filter(|s| matches!(s, GoalStatus::Active | GoalStatus::Rejected))
        .ok_or_else(|| ApiError::validation("status must be ACTIVE or REJECTED"))?;

    let goal = load_goal(&state, goal_id).await?;
    if GoalStatus::parse(&goal.status) != Some(GoalStatus::PendingApproval) {
        return Err(ApiError::validation("goal is not awaiting approval"));
    }
    if !can_approve_goal(current.role, current.id, goal.user_id) {
        return Err(ApiError::forbidden(
            "you do not have permission to approve this goal",
        ));
    }

    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::goals;
        diesel::update(goals::table.find(goal_id))
            .set((
                goals::status.eq(decision.as_str()),
                goals::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
        load_goal_response(conn, goal_id)
    })
    .await?;

    let message = match decision {
        GoalStatus::Active => "goal approved",
        _ => "goal sent back for rework",
    };
    log::info!("goal {} {} by {}", goal_id, decision.as_str(), current.id);
    Ok(Json(GoalMessageResponse {
        message: message.to_string(),
        goal: response,
    }))
}

/// PATCH /api/goals/{id}/progress - owner updates key-result values while
/// the goal is ACTIVE
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<GoalMessageResponse>, ApiError> {
    let goal = load_goal(&state, goal_id).await?;
    if goal.user_id != current.id {
        return Err(ApiError::forbidden(
            "you do not have permission to update progress on this goal",
        ));
    }
    if GoalStatus::parse(&goal.status) != Some(GoalStatus::Active) {
        return Err(ApiError::validation("goal is not active"));
    }

    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::key_results;
        let now = Utc::now();
        for input in req.key_results {
            diesel::update(
                key_results::table
                    .filter(key_results::id.eq(input.id))
                    .filter(key_results::goal_id.eq(goal_id)),
            )
            .set((
                key_results::current_value.eq(input.current_value),
                key_results::updated_at.eq(now),
            ))
            .execute(conn)?;
        }
        load_goal_response(conn, goal_id)
    })
    .await?;

    Ok(Json(GoalMessageResponse {
        message: "progress updated".to_string(),
        goal: response,
    }))
}

// ===== Helpers =====

fn build_key_results(
    goal_id: Uuid,
    inputs: Vec<KeyResultInput>,
    now: DateTime<Utc>,
) -> Vec<KeyResult> {
    inputs
        .into_iter()
        .map(|input| KeyResult {
            id: Uuid::new_v4(),
            goal_id,
            title: input.title,
            target_value: input.target_value,
            current_value: input.current_value.unwrap_or(0.0),
            unit: input.unit,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

async fn load_goal(state: &Arc<AppState>, goal_id: Uuid) -> Result<Goal, ApiError> {
    with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::goals::dsl::*;
        goals
            .find(goal_id)
            .first::<Goal>(conn)
            .optional()?
            .ok_or(ApiError::NotFound("goal"))
    })
    .await
}

fn load_goal_response(
    conn: &mut diesel::PgConnection,
    goal_id: Uuid,
) -> Result<GoalResponse, ApiError> {
    use crate::shared::models::schema::{goals, key_results, users};
    let goal = goals::table
        .find(goal_id)
        .first::<Goal>(conn)
        .optional()?
        .ok_or(ApiError::NotFound("goal"))?;
    let krs = key_results::table
        .filter(key_results::goal_id.eq(goal_id))
        .order(key_results::created_at.asc())
        .load::<KeyResult>(conn)?;
    let owner = users::table.find(goal.user_id).first::<User>(conn)?;
    Ok(to_response(goal, krs, &owner))
}
