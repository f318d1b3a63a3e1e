pub mod stats;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::one_on_ones::{find_meeting, require_participant};
use crate::permissions::{can_access_owned, is_participant};
use crate::shared::error::ApiError;
use crate::shared::models::{NextAction, OneOnOne, User};
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;
use crate::users::UserSummary;

pub use stats::{days_until_due, is_overdue, next_action_stats, sort_for_display, NextActionStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextActionStatus {
    Pending,
    InProgress,
    Completed,
}

impl NextActionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Not started",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }
}

// ===== Request/Response Structures =====

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub status: Option<String>,
    pub overdue: Option<bool>,
    pub due_this_week: Option<bool>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNextActionRequest {
    pub title: String,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNextActionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Parent-meeting context carried with every next action so a flat action
/// list can still say which 1-on-1 it came out of.
#[derive(Debug, Serialize)]
pub struct MeetingRef {
    pub id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub supervisor: UserSummary,
    pub member: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct NextActionResponse {
    pub id: Uuid,
    pub one_on_one_id: Uuid,
    pub user: UserSummary,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub one_on_one: MeetingRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ===== API Handlers =====

/// GET /api/actions - the caller's actions, or someone else's for MANAGER+
pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ActionQuery>,
) -> Result<Json<Vec<NextActionResponse>>, ApiError> {
    let target_user = params.user_id.unwrap_or(current.id);
    if !can_access_owned(current.role, current.id, target_user) {
        return Err(ApiError::forbidden(
            "you do not have permission to view these next actions",
        ));
    }
    if let Some(status) = params.status.as_deref() {
        NextActionStatus::parse(status)
            .ok_or_else(|| ApiError::validation(format!("unknown status: {}", status)))?;
    }

    let responses = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::next_actions;

        let now = Utc::now();
        let mut query = next_actions::table
            .filter(next_actions::user_id.eq(target_user))
            .into_boxed();
        if let Some(status) = params.status {
            query = query.filter(next_actions::status.eq(status));
        }
        if params.overdue.unwrap_or(false) {
            query = query
                .filter(next_actions::due_date.lt(now))
                .filter(next_actions::status.ne(NextActionStatus::Completed.as_str()));
        }
        if params.due_this_week.unwrap_or(false) {
            query = query
                .filter(next_actions::due_date.between(now, now + Duration::days(7)))
                .filter(next_actions::status.ne(NextActionStatus::Completed.as_str()));
        }
        let rows = query
            .order(next_actions::due_date.asc())
            .load::<NextAction>(conn)?;

        assemble_responses(conn, rows)
    })
    .await?;

    Ok(Json(responses))
}

/// GET /api/actions/stats - dashboard numbers over the selected user's
/// actions
pub async fn action_stats(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<NextActionStats>, ApiError> {
    let target_user = params.user_id.unwrap_or(current.id);
    if !can_access_owned(current.role, current.id, target_user) {
        return Err(ApiError::forbidden(
            "you do not have permission to view these next actions",
        ));
    }

    let rows = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::next_actions::dsl::*;
        next_actions
            .filter(user_id.eq(target_user))
            .load::<NextAction>(conn)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(next_action_stats(&rows, Utc::now())))
}

/// GET /api/actions/{id} - assignee or a participant of the parent meeting
pub async fn get_action(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(action_id): Path<Uuid>,
) -> Result<Json<NextActionResponse>, ApiError> {
    let caller = current.id;
    let response = with_conn(&state.conn, move |conn| {
        let (action, meeting) = find_action(conn, action_id)?;
        require_assignee_or_participant(
            &action,
            &meeting,
            caller,
            "you do not have permission to view this next action",
        )?;
        let mut responses = assemble_responses(conn, vec![action])?;
        responses.pop().ok_or(ApiError::Internal)
    })
    .await?;

    Ok(Json(response))
}

/// PUT /api/actions/{id}
pub async fn update_action(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(action_id): Path<Uuid>,
    Json(req): Json<UpdateNextActionRequest>,
) -> Result<Json<NextActionResponse>, ApiError> {
    let status = match req.status.as_deref() {
        Some(value) => Some(
            NextActionStatus::parse(value)
                .ok_or_else(|| ApiError::validation(format!("unknown status: {}", value)))?,
        ),
        None => None,
    };
    let caller = current.id;

    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::next_actions;

        let (mut action, meeting) = find_action(conn, action_id)?;
        require_assignee_or_participant(
            &action,
            &meeting,
            caller,
            "you do not have permission to update this next action",
        )?;

        if let Some(title) = req.title {
            if !title.trim().is_empty() {
                action.title = title.trim().to_string();
            }
        }
        if let Some(description) = req.description {
            action.description = description;
        }
        if let Some(status) = status {
            // The status is a flat field: any of the three values may be
            // set at any time by an authorized caller.
            action.status = status.as_str().to_string();
        }
        if let Some(due_date) = req.due_date {
            action.due_date = due_date;
        }
        action.updated_at = Utc::now();

        diesel::update(next_actions::table.find(action.id))
            .set(&action)
            .execute(conn)?;

        let mut responses = assemble_responses(conn, vec![action])?;
        responses.pop().ok_or(ApiError::Internal)
    })
    .await?;

    Ok(Json(response))
}

/// DELETE /api/actions/{id}
pub async fn delete_action(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(action_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let caller = current.id;
    with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::next_actions;
        let (action, meeting) = find_action(conn, action_id)?;
        require_assignee_or_participant(
            &action,
            &meeting,
            caller,
            "you do not have permission to delete this next action",
        )?;
        diesel::delete(next_actions::table.find(action.id)).execute(conn)?;
        Ok(())
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "next action deleted".to_string(),
    }))
}

/// GET /api/one-on-ones/{id}/next-actions - participants only
pub async fn list_for_meeting(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Vec<NextActionResponse>>, ApiError> {
    let caller = current.id;
    let responses = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::next_actions;
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to view this one-on-one",
        )?;
        let rows = next_actions::table
            .filter(next_actions::one_on_one_id.eq(meeting_id))
            .order(next_actions::due_date.asc())
            .load::<NextAction>(conn)?;
        assemble_responses(conn, rows)
    })
    .await?;

    Ok(Json(responses))
}

/// POST /api/one-on-ones/{id}/next-actions - participants record a
/// follow-up; the assignee must be one of the two participants
pub async fn create_for_meeting(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
    Json(req): Json<CreateNextActionRequest>,
) -> Result<(StatusCode, Json<NextActionResponse>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation(
            "title, assignee and due date are required",
        ));
    }

    let caller = current.id;
    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::next_actions;
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to add next actions to this one-on-one",
        )?;
        if !is_participant(req.user_id, meeting.supervisor_id, meeting.member_id) {
            return Err(ApiError::validation("the assignee must be a participant"));
        }

        let now = Utc::now();
        let action = NextAction {
            id: Uuid::new_v4(),
            one_on_one_id: meeting_id,
            user_id: req.user_id,
            title: req.title.trim().to_string(),
            description: req.description.unwrap_or_default(),
            due_date: req.due_date,
            status: NextActionStatus::Pending.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        let created = diesel::insert_into(next_actions::table)
            .values(&action)
            .get_result::<NextAction>(conn)?;

        let mut responses = assemble_responses(conn, vec![created])?;
        responses.pop().ok_or(ApiError::Internal)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

// ===== Helpers =====

fn find_action(
    conn: &mut diesel::PgConnection,
    action_id: Uuid,
) -> Result<(NextAction, OneOnOne), ApiError> {
    use crate::shared::models::schema::next_actions;
    let action = next_actions::table
        .find(action_id)
        .first::<NextAction>(conn)
        .optional()?
        .ok_or(ApiError::NotFound("next action"))?;
    let meeting = find_meeting(conn, action.one_on_one_id)?;
    Ok((action, meeting))
}

fn require_assignee_or_participant(
    action: &NextAction,
    meeting: &OneOnOne,
    user_id: Uuid,
    denied: &str,
) -> Result<(), ApiError> {
    let is_assignee = action.user_id == user_id;
    if is_assignee || is_participant(user_id, meeting.supervisor_id, meeting.member_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(denied))
    }
}

/// Builds the flat-list payloads: each action carries its assignee and the
/// parent meeting with both participants.
pub(crate) fn assemble_responses(
    conn: &mut diesel::PgConnection,
    rows: Vec<NextAction>,
) -> Result<Vec<NextActionResponse>, ApiError> {
    use crate::shared::models::schema::{one_on_ones, users};

    let meeting_ids: Vec<Uuid> = rows.iter().map(|a| a.one_on_one_id).collect();
    let meetings: HashMap<Uuid, OneOnOne> = one_on_ones::table
        .filter(one_on_ones::id.eq_any(&meeting_ids))
        .load::<OneOnOne>(conn)?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut user_ids: Vec<Uuid> = rows.iter().map(|a| a.user_id).collect();
    for meeting in meetings.values() {
        user_ids.push(meeting.supervisor_id);
        user_ids.push(meeting.member_id);
    }
    user_ids.sort_unstable();
    user_ids.dedup();
    let people: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&user_ids))
        .load::<User>(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let summary = |user_id: Uuid| -> Result<UserSummary, ApiError> {
        people.get(&user_id).map(UserSummary::from).ok_or_else(|| {
            log::error!("missing user row {} while assembling next action", user_id);
            ApiError::Internal
        })
    };

    rows.into_iter()
        .map(|action| {
            let meeting = meetings
                .get(&action.one_on_one_id)
                .ok_or(ApiError::Internal)?;
            Ok(NextActionResponse {
                id: action.id,
                one_on_one_id: action.one_on_one_id,
                user: summary(action.user_id)?,
                title: action.title,
                description: action.description,
                due_date: action.due_date,
                status: action.status,
                one_on_one: MeetingRef {
                    id: meeting.id,
                    scheduled_at: meeting.scheduled_at,
                    supervisor: summary(meeting.supervisor_id)?,
                    member: summary(meeting.member_id)?,
                },
                created_at: action.created_at,
                updated_at: action.updated_at,
            })
        })
        .collect()
}
