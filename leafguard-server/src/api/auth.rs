//! Authentication endpoints
//!
//! Opaque random tokens, hashed at rest. The access token goes in the
//! `Authorization: Bearer` header; the refresh token is single use and
//! rotates the whole pair.

use crate::db::{sessions, users};
use crate::error::{Error, Result};
use crate::server::AppContext;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use leafguard_common::auth;
use leafguard_common::db::models::User;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Authenticated user, extracted from the Bearer access token
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> Result<Self> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Unauthorized("missing Authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("expected a Bearer token".to_string()))?;

        let user = sessions::user_for_access_token(&state.db_pool, token)
            .await?
            .ok_or_else(|| Error::Unauthorized("invalid or expired token".to_string()))?;

        Ok(CurrentUser(user))
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl TokenResponse {
    fn new(tokens: sessions::IssuedTokens, user: Option<User>) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "bearer",
            expires_in: tokens.access_expires_in,
            user,
        }
    }
}

/// POST /auth/register
pub async fn register(
    State(context): State<AppContext>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<User>)> {
    let username = credentials.username.trim();
    if username.is_empty() || username.len() > 64 {
        return Err(Error::BadRequest(
            "username must be 1-64 characters".to_string(),
        ));
    }
    if credentials.password.len() < 6 {
        return Err(Error::BadRequest(
            "password must be at least 6 characters".to_string(),
        ));
    }

    let salt = auth::generate_salt();
    let hash = auth::hash_password(&credentials.password, &salt);
    let user = users::create_user(&context.db_pool, username, &hash, &salt).await?;

    info!("Registered user {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login
pub async fn login(
    State(context): State<AppContext>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenResponse>> {
    let user = users::get_user_by_username(&context.db_pool, credentials.username.trim())
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid username or password".to_string()))?;

    if !auth::verify_password(&credentials.password, &user.password_salt, &user.password_hash) {
        return Err(Error::Unauthorized(
            "invalid username or password".to_string(),
        ));
    }

    // Login is a convenient moment to drop dead sessions
    let pruned = sessions::prune_expired(&context.db_pool).await?;
    if pruned > 0 {
        info!("Pruned {} expired sessions", pruned);
    }

    let tokens = sessions::create_session(&context.db_pool, &user.guid).await?;
    info!("User {} logged in", user.username);

    Ok(Json(TokenResponse::new(tokens, Some(user))))
}

/// POST /auth/refresh
pub async fn refresh(
    State(context): State<AppContext>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    let tokens = sessions::refresh_session(&context.db_pool, &request.refresh_token)
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid or expired refresh token".to_string()))?;

    Ok(Json(TokenResponse::new(tokens, None)))
}

/// GET /auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
