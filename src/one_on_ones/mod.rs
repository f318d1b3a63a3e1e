pub mod actions;
pub mod agendas;
pub mod minutes;
pub mod templates;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::permissions::{can_supervise, is_participant, Role};
use crate::shared::error::ApiError;
use crate::shared::models::{Agenda, Minute, NextAction, OneOnOne, User};
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;
use crate::users::UserSummary;

pub use actions::{available_actions, within_conduct_window, AvailableActions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OneOnOneStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl OneOnOneStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SCHEDULED" => Some(Self::Scheduled),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// SCHEDULED is the only state a meeting can leave.
    pub fn is_terminal(self) -> bool {
        self != Self::Scheduled
    }
}

// ===== Request/Response Structures =====

#[derive(Debug, Deserialize)]
pub struct OneOnOneQuery {
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AgendaInput {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOneOnOneRequest {
    pub supervisor_id: Uuid,
    pub member_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub agendas: Option<Vec<AgendaInput>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOneOnOneRequest {
    pub supervisor_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub agendas: Option<Vec<AgendaInput>>,
}

#[derive(Debug, Serialize)]
pub struct MinuteResponse {
    pub id: Uuid,
    pub one_on_one_id: Uuid,
    pub speaker: UserSummary,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeetingNextAction {
    pub id: Uuid,
    pub user: UserSummary,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OneOnOneResponse {
    pub id: Uuid,
    pub supervisor: UserSummary,
    pub member: UserSummary,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub agendas: Vec<Agenda>,
    pub minutes: Vec<MinuteResponse>,
    pub next_actions: Vec<MeetingNextAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_actions: Option<AvailableActions>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ===== API Handlers =====

/// GET /api/one-on-ones - meetings the caller participates in
pub async fn list_one_on_ones(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<OneOnOneQuery>,
) -> Result<Json<Vec<OneOnOneResponse>>, ApiError> {
    if let Some(status) = params.status.as_deref() {
        OneOnOneStatus::parse(status)
            .ok_or_else(|| ApiError::validation(format!("unknown status: {}", status)))?;
    }
    let caller = current.id;

    let responses = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::one_on_ones;

        let mut query = one_on_ones::table
            .filter(
                one_on_ones::supervisor_id
                    .eq(caller)
                    .or(one_on_ones::member_id.eq(caller)),
            )
            .into_boxed();
        if let Some(status) = params.status {
            query = query.filter(one_on_ones::status.eq(status));
        }
        if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
            query = query.filter(one_on_ones::scheduled_at.between(start, end));
        }
        let meetings = query
            .order(one_on_ones::scheduled_at.desc())
            .load::<OneOnOne>(conn)?;

        assemble_responses(conn, meetings, None)
    })
    .await?;

    Ok(Json(responses))
}

/// POST /api/one-on-ones - the member requests a meeting with a supervisor
pub async fn create_one_on_one(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateOneOnOneRequest>,
) -> Result<(StatusCode, Json<OneOnOneResponse>), ApiError> {
    let member_id = req.member_id.unwrap_or(current.id);
    if member_id != current.id {
        return Err(ApiError::forbidden(
            "you can only request your own one-on-ones",
        ));
    }

    let supervisor_id = req.supervisor_id;
    let scheduled_at = req.scheduled_at;
    let now = Utc::now();
    let meeting = OneOnOne {
        id: Uuid::new_v4(),
        supervisor_id,
        member_id,
        scheduled_at,
        status: OneOnOneStatus::Scheduled.as_str().to_string(),
        created_at: now,
        updated_at: now,
    };
    let new_agendas = build_agendas(meeting.id, req.agendas.unwrap_or_default(), now);

    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{agendas, one_on_ones, users};

        let supervisor = users::table
            .find(supervisor_id)
            .first::<User>(conn)
            .optional()?
            .ok_or(ApiError::NotFound("supervisor"))?;
        users::table
            .find(member_id)
            .first::<User>(conn)
            .optional()?
            .ok_or(ApiError::NotFound("member"))?;

        let supervisor_role = Role::parse(&supervisor.role).ok_or(ApiError::Internal)?;
        if !can_supervise(supervisor_role) {
            return Err(ApiError::validation(
                "the selected user does not hold a supervisor role",
            ));
        }

        // No participant may hold two SCHEDULED meetings in the same slot.
        let clash = one_on_ones::table
            .filter(one_on_ones::scheduled_at.eq(scheduled_at))
            .filter(one_on_ones::status.eq(OneOnOneStatus::Scheduled.as_str()))
            .filter(
                one_on_ones::supervisor_id
                    .eq(supervisor_id)
                    .or(one_on_ones::member_id.eq(supervisor_id))
                    .or(one_on_ones::supervisor_id.eq(member_id))
                    .or(one_on_ones::member_id.eq(member_id)),
            )
            .select(one_on_ones::id)
            .first::<Uuid>(conn)
            .optional()?;
        if clash.is_some() {
            return Err(ApiError::conflict(
                "a one-on-one is already scheduled at that time",
            ));
        }

        let created = diesel::insert_into(one_on_ones::table)
            .values(&meeting)
            .get_result::<OneOnOne>(conn)?;
        diesel::insert_into(agendas::table)
            .values(&new_agendas)
            .execute(conn)?;

        let mut responses = assemble_responses(conn, vec![created], None)?;
        responses.pop().ok_or(ApiError::Internal)
    })
    .await?;

    log::info!(
        "one-on-one {} requested by {} with supervisor {}",
        response.id,
        current.id,
        supervisor_id
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/one-on-ones/{id} - participants only; embeds availability flags
pub async fn get_one_on_one(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<OneOnOneResponse>, ApiError> {
    let caller = current.id;
    let response = with_conn(&state.conn, move |conn| {
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(&meeting, caller, "you do not have permission to view this one-on-one")?;
        let mut responses = assemble_responses(conn, vec![meeting], Some(Utc::now()))?;
        responses.pop().ok_or(ApiError::Internal)
    })
    .await?;

    Ok(Json(response))
}

/// PUT /api/one-on-ones/{id} - participants may reschedule, change the
/// supervisor, set the status or replace the agenda list
pub async fn update_one_on_one(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
    Json(req): Json<UpdateOneOnOneRequest>,
) -> Result<Json<OneOnOneResponse>, ApiError> {
    let status = match req.status.as_deref() {
        Some(value) => Some(
            OneOnOneStatus::parse(value)
                .ok_or_else(|| ApiError::validation(format!("unknown status: {}", value)))?,
        ),
        None => None,
    };
    let caller = current.id;

    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{agendas, one_on_ones, users};

        let mut meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to update this one-on-one",
        )?;

        if let Some(supervisor_id) = req.supervisor_id {
            let supervisor = users::table
                .find(supervisor_id)
                .first::<User>(conn)
                .optional()?
                .ok_or(ApiError::NotFound("supervisor"))?;
            let supervisor_role = Role::parse(&supervisor.role).ok_or(ApiError::Internal)?;
            if !can_supervise(supervisor_role) {
                return Err(ApiError::validation(
                    "the selected user does not hold a supervisor role",
                ));
            }
            meeting.supervisor_id = supervisor_id;
        }
        if let Some(scheduled_at) = req.scheduled_at {
            meeting.scheduled_at = scheduled_at;
        }
        if let Some(status) = status {
            meeting.status = status.as_str().to_string();
        }
        meeting.updated_at = Utc::now();

        diesel::update(one_on_ones::table.find(meeting.id))
            .set(&meeting)
            .execute(conn)?;

        if let Some(inputs) = req.agendas {
            let replacement = build_agendas(meeting_id, inputs, meeting.updated_at);
            diesel::delete(agendas::table.filter(agendas::one_on_one_id.eq(meeting_id)))
                .execute(conn)?;
            diesel::insert_into(agendas::table)
                .values(&replacement)
                .execute(conn)?;
        }

        let mut responses = assemble_responses(conn, vec![meeting], Some(Utc::now()))?;
        responses.pop().ok_or(ApiError::Internal)
    })
    .await?;

    Ok(Json(response))
}

/// DELETE /api/one-on-ones/{id} - cancellation is a status update, the
/// row and its history stay
pub async fn cancel_one_on_one(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let caller = current.id;
    with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::one_on_ones;
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to cancel this one-on-one",
        )?;
        diesel::update(one_on_ones::table.find(meeting_id))
            .set((
                one_on_ones::status.eq(OneOnOneStatus::Cancelled.as_str()),
                one_on_ones::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
        Ok(())
    })
    .await?;

    log::info!("one-on-one {} cancelled by {}", meeting_id, caller);
    Ok(Json(MessageResponse {
        message: "one-on-one cancelled".to_string(),
    }))
}

// ===== Helpers =====

pub(crate) fn find_meeting(
    conn: &mut diesel::PgConnection,
    meeting_id: Uuid,
) -> Result<OneOnOne, ApiError> {
    use crate::shared::models::schema::one_on_ones::dsl::*;
    one_on_ones
        .find(meeting_id)
        .first::<OneOnOne>(conn)
        .optional()?
        .ok_or(ApiError::NotFound("one-on-one"))
}

pub(crate) fn require_participant(
    meeting: &OneOnOne,
    user_id: Uuid,
    denied: &str,
) -> Result<(), ApiError> {
    if is_participant(user_id, meeting.supervisor_id, meeting.member_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(denied))
    }
}

fn build_agendas(meeting_id: Uuid, inputs: Vec<AgendaInput>, now: DateTime<Utc>) -> Vec<Agenda> {
    inputs
        .into_iter()
        .map(|input| Agenda {
            id: Uuid::new_v4(),
            one_on_one_id: meeting_id,
            title: input.title,
            description: input.description.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// Loads all children and participant rows for a batch of meetings and
/// builds the detail payloads. `actions_at` is set when the caller is a
/// participant and wants the availability flags evaluated at that instant.
fn assemble_responses(
    conn: &mut diesel::PgConnection,
    meetings: Vec<OneOnOne>,
    actions_at: Option<DateTime<Utc>>,
) -> Result<Vec<OneOnOneResponse>, ApiError> {
    use crate::shared::models::schema::{agendas, minutes, next_actions, users};

    let meeting_ids: Vec<Uuid> = meetings.iter().map(|m| m.id).collect();

    let agenda_rows = agendas::table
        .filter(agendas::one_on_one_id.eq_any(&meeting_ids))
        .order(agendas::created_at.asc())
        .load::<Agenda>(conn)?;
    let minute_rows = minutes::table
        .filter(minutes::one_on_one_id.eq_any(&meeting_ids))
        .order(minutes::timestamp.asc())
        .load::<Minute>(conn)?;
    let action_rows = next_actions::table
        .filter(next_actions::one_on_one_id.eq_any(&meeting_ids))
        .order(next_actions::due_date.asc())
        .load::<NextAction>(conn)?;

    let mut user_ids: Vec<Uuid> = Vec::new();
    for meeting in &meetings {
        user_ids.push(meeting.supervisor_id);
        user_ids.push(meeting.member_id);
    }
    user_ids.extend(minute_rows.iter().map(|m| m.speaker_id));
    user_ids.extend(action_rows.iter().map(|a| a.user_id));
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
            log::error!("missing user row {} while assembling one-on-one", user_id);
            ApiError::Internal
        })
    };

    let mut agendas_by_meeting: HashMap<Uuid, Vec<Agenda>> = HashMap::new();
    for row in agenda_rows {
        agendas_by_meeting
            .entry(row.one_on_one_id)
            .or_default()
            .push(row);
    }
    let mut minutes_by_meeting: HashMap<Uuid, Vec<Minute>> = HashMap::new();
    for row in minute_rows {
        minutes_by_meeting
            .entry(row.one_on_one_id)
            .or_default()
            .push(row);
    }
    let mut actions_by_meeting: HashMap<Uuid, Vec<NextAction>> = HashMap::new();
    for row in action_rows {
        actions_by_meeting
            .entry(row.one_on_one_id)
            .or_default()
            .push(row);
    }

    let mut responses = Vec::with_capacity(meetings.len());
    for meeting in meetings {
        let minutes = minutes_by_meeting
            .remove(&meeting.id)
            .unwrap_or_default()
            .into_iter()
            .map(|m| {
                Ok(MinuteResponse {
                    id: m.id,
                    one_on_one_id: m.one_on_one_id,
                    speaker: summary(m.speaker_id)?,
                    content: m.content,
                    timestamp: m.timestamp,
                    created_at: m.created_at,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        let next_actions = actions_by_meeting
            .remove(&meeting.id)
            .unwrap_or_default()
            .into_iter()
            .map(|a| {
                Ok(MeetingNextAction {
                    id: a.id,
                    user: summary(a.user_id)?,
                    title: a.title,
                    description: a.description,
                    due_date: a.due_date,
                    status: a.status,
                    created_at: a.created_at,
                    updated_at: a.updated_at,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let available = match actions_at {
            Some(now) => {
                let status = OneOnOneStatus::parse(&meeting.status).ok_or(ApiError::Internal)?;
                Some(available_actions(status, true, meeting.scheduled_at, now))
            }
            None => None,
        };

        responses.push(OneOnOneResponse {
            id: meeting.id,
            supervisor: summary(meeting.supervisor_id)?,
            member: summary(meeting.member_id)?,
            scheduled_at: meeting.scheduled_at,
            status: meeting.status,
            agendas: agendas_by_meeting.remove(&meeting.id).unwrap_or_default(),
            minutes,
            next_actions,
            available_actions: available,
            created_at: meeting.created_at,
            updated_at: meeting.updated_at,
        });
    }

    Ok(responses)
}
