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

use crate::auth::{hash_password, CurrentUser};
use crate::permissions::{
    can_change_role, can_delete_user, can_edit_user, can_view_user, has_permission, Role,
};
use crate::shared::error::ApiError;
use crate::shared::models::{Department, User};
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;

// ===== Request/Response Structures =====

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub department_id: Option<Uuid>,
    pub client_company_name: Option<String>,
}

/// Double-`Option` fields distinguish "absent" (leave unchanged) from
/// explicit `null` (clear the value).
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub department_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub client_company_name: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub role: Option<String>,
    pub department_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department_id: Option<Uuid>,
    pub department: Option<Department>,
    pub client_company_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            department_id: user.department_id,
            department: None,
            client_company_name: user.client_company_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl UserResponse {
    pub fn with_department(mut self, department: Option<Department>) -> Self {
        self.department = department;
        self
    }
}

/// Slim participant/owner projection embedded in goal and meeting payloads.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SupervisorResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub client_company_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ===== API Handlers =====

/// GET /api/users - list users, MANAGER and above
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    if !has_permission(current.role, Role::Manager) {
        return Err(ApiError::forbidden(
            "you do not have permission to list users",
        ));
    }

    let (rows, departments) = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{departments, users};

        let mut query = users::table.into_boxed();
        if let Some(role) = params.role {
            query = query.filter(users::role.eq(role));
        }
        if let Some(dept) = params.department_id {
            query = query.filter(users::department_id.eq(dept));
        }
        if let Some(search) = params.search {
            let pattern = format!("%{}%", search);
            query = query.filter(
                users::name
                    .ilike(pattern.clone())
                    .nullable()
                    .or(users::email.ilike(pattern.clone()).nullable())
                    .or(users::client_company_name.ilike(pattern)),
            );
        }
        let rows = query.order(users::created_at.desc()).load::<User>(conn)?;
        let departments = departments::table.load::<Department>(conn)?;
        Ok((rows, departments))
    })
    .await?;

    let by_id: HashMap<Uuid, Department> =
        departments.into_iter().map(|d| (d.id, d)).collect();
    let responses = rows
        .into_iter()
        .map(|user| {
            let department = user.department_id.and_then(|d| by_id.get(&d).cloned());
            UserResponse::from(user).with_department(department)
        })
        .collect();

    Ok(Json(responses))
}

/// POST /api/users - create a user, MANAGER and above
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !has_permission(current.role, Role::Manager) {
        return Err(ApiError::forbidden(
            "you do not have permission to create users",
        ));
    }
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("name, email and password are required"));
    }

    let role = match req.role.as_deref() {
        Some(value) => Role::parse(value)
            .ok_or_else(|| ApiError::validation(format!("unknown role: {}", value)))?,
        None => Role::General,
    };

    let password_hash = hash_password(&req.password)?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password_hash,
        role: role.as_str().to_string(),
        department_id: req.department_id,
        client_company_name: req.client_company_name,
        created_at: now,
        updated_at: now,
    };

    let (created, department) = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{departments, users};
        let exists = users::table
            .filter(users::email.eq(&user.email))
            .select(users::id)
            .first::<Uuid>(conn)
            .optional()?;
        if exists.is_some() {
            return Err(ApiError::conflict("this email address is already in use"));
        }
        let created = diesel::insert_into(users::table)
            .values(&user)
            .get_result::<User>(conn)?;
        let department = match created.department_id {
            Some(dept) => departments::table
                .filter(departments::id.eq(dept))
                .first::<Department>(conn)
                .optional()?,
            None => None,
        };
        Ok((created, department))
    })
    .await?;

    log::info!("user {} created {}", current.id, created.id);
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from(created).with_department(department)),
    ))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let (user, department) = load_user_with_department(&state, user_id).await?;

    if !can_view_user(
        current.role,
        current.id,
        user.id,
        user.department_id,
        current.department_id,
    ) {
        return Err(ApiError::forbidden(
            "you do not have permission to view this user",
        ));
    }

    Ok(Json(UserResponse::from(user).with_department(department)))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let (mut user, _) = load_user_with_department(&state, user_id).await?;
    let target_role = Role::parse(&user.role).ok_or(ApiError::Internal)?;

    if !can_edit_user(current.role, current.id, user.id, target_role) {
        return Err(ApiError::forbidden(
            "you do not have permission to edit this user",
        ));
    }

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
        user.name = name.trim().to_string();
    }
    if let Some(email) = req.email {
        if email.trim().is_empty() {
            return Err(ApiError::validation("email must not be empty"));
        }
        user.email = email.trim().to_lowercase();
    }
    if let Some(password) = req.password {
        if !password.is_empty() {
            user.password_hash = hash_password(&password)?;
        }
    }
    // A role change on your own profile is silently ignored; on anyone
    // else it has to pass the role-change rules.
    if let Some(role) = req.role {
        if current.id != user.id {
            let new_role = Role::parse(&role)
                .ok_or_else(|| ApiError::validation(format!("unknown role: {}", role)))?;
            if !can_change_role(current.role, target_role, new_role) {
                return Err(ApiError::forbidden(
                    "you do not have permission to change this user's role",
                ));
            }
            user.role = new_role.as_str().to_string();
        }
    }
    if let Some(department_id) = req.department_id {
        user.department_id = department_id;
    }
    if let Some(client_company_name) = req.client_company_name {
        user.client_company_name = client_company_name;
    }
    user.updated_at = Utc::now();

    let (updated, department) = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{departments, users};
        let updated = diesel::update(users::table.find(user.id))
            .set(&user)
            .get_result::<User>(conn)?;
        let department = match updated.department_id {
            Some(dept) => departments::table
                .filter(departments::id.eq(dept))
                .first::<Department>(conn)
                .optional()?,
            None => None,
        };
        Ok((updated, department))
    })
    .await?;

    Ok(Json(UserResponse::from(updated).with_department(department)))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (user, _) = load_user_with_department(&state, user_id).await?;

    if current.id == user.id {
        return Err(ApiError::validation("you cannot delete yourself"));
    }
    let target_role = Role::parse(&user.role).ok_or(ApiError::Internal)?;
    if !can_delete_user(current.role, target_role) {
        return Err(ApiError::forbidden(
            "you do not have permission to delete this user",
        ));
    }

    with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::users::dsl::*;
        diesel::delete(users.find(user_id)).execute(conn)?;
        Ok(())
    })
    .await?;

    log::info!("user {} deleted {}", current.id, user_id);
    Ok(Json(MessageResponse {
        message: "user deleted".to_string(),
    }))
}

/// GET /api/users/supervisors - everyone who can take the supervisor seat,
/// most senior first, excluding the caller
pub async fn list_supervisors(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<SupervisorResponse>>, ApiError> {
    let caller = current.id;
    let mut rows = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::users::dsl::*;
        let supervisor_roles = [
            Role::Leader.as_str(),
            Role::Manager.as_str(),
            Role::Director.as_str(),
            Role::Executive.as_str(),
        ];
        users
            .filter(role.eq_any(supervisor_roles))
            .filter(id.ne(caller))
            .load::<User>(conn)
            .map_err(ApiError::from)
    })
    .await?;

    rows.sort_by(|a, b| {
        crate::permissions::role_rank(&b.role)
            .cmp(&crate::permissions::role_rank(&a.role))
            .then_with(|| a.name.cmp(&b.name))
    });

    let supervisors = rows
        .into_iter()
        .map(|user| SupervisorResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            client_company_name: user.client_company_name,
        })
        .collect();

    Ok(Json(supervisors))
}

async fn load_user_with_department(
    state: &Arc<AppState>,
    user_id: Uuid,
) -> Result<(User, Option<Department>), ApiError> {
    with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::{departments, users};
        let user = users::table
            .find(user_id)
            .first::<User>(conn)
            .optional()?
            .ok_or(ApiError::NotFound("user"))?;
        let department = match user.department_id {
            Some(dept) => departments::table
                .filter(departments::id.eq(dept))
                .first::<Department>(conn)
                .optional()?,
            None => None,
        };
        Ok((user, department))
    })
    .await
}
