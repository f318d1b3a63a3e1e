use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::permissions::Role;
use crate::shared::error::ApiError;
use crate::shared::models::User;
use crate::shared::state::AppState;
use crate::shared::utils::with_conn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated identity resolved for the current request and stored in
/// request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department_id: Option<Uuid>,
}

pub fn issue_token(user_id: Uuid, secret: &str, ttl_hours: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        log::error!("failed to sign token: {}", e);
        ApiError::Internal
    })
}

fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["sub", "exp"]);
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

/// Validates the bearer token, loads the user row and inserts a
/// `CurrentUser` into request extensions for the handlers downstream.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = validate_token(token, &state.config.auth.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

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

    let role = Role::parse(&user.role).ok_or_else(|| {
        log::error!("user {} has unknown role {:?}", user.id, user.role);
        ApiError::Internal
    })?;

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role,
        department_id: user.department_id,
    });

    Ok(next.run(request).await)
}
