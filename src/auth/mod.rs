pub mod middleware;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::permissions::Role;
use crate::shared::error::ApiError;
use crate::shared::models::User;
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;
use crate::users::UserResponse;

pub use middleware::{auth_middleware, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// POST /api/auth/register - self-service signup, always as GENERAL
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("name, email and password are required"));
    }

    let password_hash = hash_password(&req.password)?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password_hash,
        role: Role::General.as_str().to_string(),
        department_id: None,
        client_company_name: None,
        created_at: now,
        updated_at: now,
    };

    let created = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::users::dsl::*;
        let exists = users
            .filter(email.eq(&user.email))
            .select(id)
            .first::<Uuid>(conn)
            .optional()?;
        if exists.is_some() {
            return Err(ApiError::conflict("this email address is already in use"));
        }
        diesel::insert_into(users)
            .values(&user)
            .get_result::<User>(conn)
            .map_err(ApiError::from)
    })
    .await?;

    log::info!("registered user {} ({})", created.id, created.email);
    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let lookup = req.email.trim().to_lowercase();
    let user = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::users::dsl::*;
        users
            .filter(email.eq(&lookup))
            .first::<User>(conn)
            .optional()
            .map_err(ApiError::from)
    })
    .await?
    .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = middleware::issue_token(
        user.id,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = current.id;
    let user = with_conn(&state.conn, move |conn| {
        use crate::shared::models::schema::users::dsl::*;
        users
            .filter(id.eq(user_id))
            .first::<User>(conn)
            .optional()
            .map_err(ApiError::from)
    })
    .await?
    .ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserResponse::from(user)))
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("failed to hash password: {}", e);
            ApiError::Internal
        })
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
