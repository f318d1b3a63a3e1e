use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{find_meeting, require_participant, MinuteResponse};
use crate::auth::CurrentUser;
use crate::permissions::is_participant;
use crate::shared::error::ApiError;
use crate::shared::models::{Minute, User};
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;
use crate::users::UserSummary;

#[derive(Debug, Deserialize)]
pub struct CreateMinuteRequest {
    pub content: String,
    pub speaker_id: Option<Uuid>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// GET /api/one-on-ones/{id}/minutes - participants only, oldest first
pub async fn list_minutes(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Vec<MinuteResponse>>, ApiError> {
    let caller = current.id;
    let responses = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{minutes, users};
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to view this one-on-one",
        )?;

        let rows = minutes::table
            .filter(minutes::one_on_one_id.eq(meeting_id))
            .order(minutes::timestamp.asc())
            .load::<Minute>(conn)?;

        let speaker_ids: Vec<Uuid> = rows.iter().map(|m| m.speaker_id).collect();
        let speakers: std::collections::HashMap<Uuid, User> = users::table
            .filter(users::id.eq_any(&speaker_ids))
            .load::<User>(conn)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        rows.into_iter()
            .map(|m| {
                let speaker = speakers
                    .get(&m.speaker_id)
                    .map(UserSummary::from)
                    .ok_or(ApiError::Internal)?;
                Ok(MinuteResponse {
                    id: m.id,
                    one_on_one_id: m.one_on_one_id,
                    speaker,
                    content: m.content,
                    timestamp: m.timestamp,
                    created_at: m.created_at,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()
    })
    .await?;

    Ok(Json(responses))
}

/// POST /api/one-on-ones/{id}/minutes - append a minutes entry; the
/// speaker defaults to the caller and must be one of the two participants
pub async fn create_minute(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
    Json(req): Json<CreateMinuteRequest>,
) -> Result<(StatusCode, Json<MinuteResponse>), ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::validation("minutes content is required"));
    }

    let caller = current.id;
    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{minutes, users};
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to add minutes to this one-on-one",
        )?;

        let speaker_id = req.speaker_id.unwrap_or(caller);
        if !is_participant(speaker_id, meeting.supervisor_id, meeting.member_id) {
            return Err(ApiError::validation("the speaker must be a participant"));
        }

        let now = Utc::now();
        let minute = Minute {
            id: Uuid::new_v4(),
            one_on_one_id: meeting_id,
            speaker_id,
            content: req.content,
            timestamp: req.timestamp.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };
        let created = diesel::insert_into(minutes::table)
            .values(&minute)
            .get_result::<Minute>(conn)?;

        let speaker = users::table.find(speaker_id).first::<User>(conn)?;
        Ok(MinuteResponse {
            id: created.id,
            one_on_one_id: created.one_on_one_id,
            speaker: UserSummary::from(&speaker),
            content: created.content,
            timestamp: created.timestamp,
            created_at: created.created_at,
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
