use axum::extract::State;
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
use crate::permissions::{has_permission, Role};
use crate::shared::error::ApiError;
use crate::shared::models::Department;
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DepartmentResponse {
    pub id: Uuid,
    pub name: String,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_response(department: Department, member_count: i64) -> DepartmentResponse {
    DepartmentResponse {
        id: department.id,
        name: department.name,
        member_count,
        created_at: department.created_at,
        updated_at: department.updated_at,
    }
}

/// GET /api/departments - any authenticated user, name ascending
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<Json<Vec<DepartmentResponse>>, ApiError> {
    let (rows, memberships) = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{departments, users};
        let rows = departments::table
            .order(departments::name.asc())
            .load::<Department>(conn)?;
        let memberships = users::table
            .select(users::department_id)
            .load::<Option<Uuid>>(conn)?;
        Ok((rows, memberships))
    })
    .await?;

    let mut counts: HashMap<Uuid, i64> = HashMap::new();
    for dept in memberships.into_iter().flatten() {
        *counts.entry(dept).or_insert(0) += 1;
    }

    let responses = rows
        .into_iter()
        .map(|d| {
            let count = counts.get(&d.id).copied().unwrap_or(0);
            to_response(d, count)
        })
        .collect();

    Ok(Json(responses))
}

/// POST /api/departments - MANAGER and above
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<DepartmentResponse>), ApiError> {
    if !has_permission(current.role, Role::Manager) {
        return Err(ApiError::forbidden(
            "you do not have permission to create departments",
        ));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("department name is required"));
    }

    let now = Utc::now();
    let department = Department {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        created_at: now,
        updated_at: now,
    };

    let created = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::departments::dsl::*;
        diesel::insert_into(departments)
            .values(&department)
            .get_result::<Department>(conn)
            .map_err(ApiError::from)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(created, 0))))
}
