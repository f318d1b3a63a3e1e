use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::{find_meeting, require_participant, AgendaInput};
use crate::auth::CurrentUser;
use crate::shared::error::ApiError;
use crate::shared::models::Agenda;
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;

/// GET /api/one-on-ones/{id}/agendas - participants only
pub async fn list_agendas(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Vec<Agenda>>, ApiError> {
    let caller = current.id;
    let rows = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::agendas;
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to view this one-on-one",
        )?;
        agendas::table
            .filter(agendas::one_on_one_id.eq(meeting_id))
            .order(agendas::created_at.asc())
            .load::<Agenda>(conn)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(rows))
}

/// POST /api/one-on-ones/{id}/agendas - participants add a topic
pub async fn create_agenda(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(meeting_id): Path<Uuid>,
    Json(req): Json<AgendaInput>,
) -> Result<(StatusCode, Json<Agenda>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("agenda title is required"));
    }

    let caller = current.id;
    let created = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::agendas;
        let meeting = find_meeting(conn, meeting_id)?;
        require_participant(
            &meeting,
            caller,
            "you do not have permission to add agendas to this one-on-one",
        )?;

        let now = Utc::now();
        let agenda = Agenda {
            id: Uuid::new_v4(),
            one_on_one_id: meeting_id,
            title: req.title.trim().to_string(),
            description: req.description.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        diesel::insert_into(agendas::table)
            .values(&agenda)
            .get_result::<Agenda>(conn)
            .map_err(ApiError::from)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
