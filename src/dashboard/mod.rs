use axum::extract::State;
use axum::response::Json;
use axum::Extension;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::next_actions::{
    assemble_responses, next_action_stats, sort_for_display, NextActionResponse, NextActionStats,
    NextActionStatus,
};
use crate::one_on_ones::OneOnOneStatus;
use crate::shared::error::ApiError;
use crate::shared::models::{NextAction, OneOnOne, User};
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;
use crate::users::UserSummary;

const UPCOMING_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct UpcomingOneOnOne {
    pub id: Uuid,
    pub supervisor: UserSummary,
    pub member: UserSummary,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub upcoming_one_on_ones: Vec<UpcomingOneOnOne>,
    pub pending_actions: Vec<NextActionResponse>,
    pub stats: NextActionStats,
}

/// GET /api/dashboard - the caller's next meetings, open actions and
/// action stats in one payload
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let caller = current.id;
    let response = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{next_actions, one_on_ones, users};

        let now = Utc::now();
        let upcoming = one_on_ones::table
            .filter(
                one_on_ones::supervisor_id
                    .eq(caller)
                    .or(one_on_ones::member_id.eq(caller)),
            )
            .filter(one_on_ones::status.eq(OneOnOneStatus::Scheduled.as_str()))
            .filter(one_on_ones::scheduled_at.ge(now))
            .order(one_on_ones::scheduled_at.asc())
            .limit(UPCOMING_LIMIT)
            .load::<OneOnOne>(conn)?;

        let mut participant_ids: Vec<Uuid> = upcoming
            .iter()
            .flat_map(|m| [m.supervisor_id, m.member_id])
            .collect();
        participant_ids.sort_unstable();
        participant_ids.dedup();
        let people: HashMap<Uuid, User> = users::table
            .filter(users::id.eq_any(&participant_ids))
            .load::<User>(conn)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let summary = |user_id: Uuid| -> Result<UserSummary, ApiError> {
            people
                .get(&user_id)
                .map(UserSummary::from)
                .ok_or(ApiError::Internal)
        };
        let upcoming_one_on_ones = upcoming
            .into_iter()
            .map(|m| {
                Ok(UpcomingOneOnOne {
                    id: m.id,
                    supervisor: summary(m.supervisor_id)?,
                    member: summary(m.member_id)?,
                    scheduled_at: m.scheduled_at,
                    status: m.status,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let all_actions = next_actions::table
            .filter(next_actions::user_id.eq(caller))
            .load::<NextAction>(conn)?;
        let stats = next_action_stats(&all_actions, now);

        let mut open_actions: Vec<NextAction> = all_actions
            .into_iter()
            .filter(|a| {
                NextActionStatus::parse(&a.status) != Some(NextActionStatus::Completed)
            })
            .collect();
        sort_for_display(&mut open_actions);
        let pending_actions = assemble_responses(conn, open_actions)?;

        Ok(DashboardResponse {
            upcoming_one_on_ones,
            pending_actions,
            stats,
        })
    })
    .await?;

    Ok(Json(response))
}
