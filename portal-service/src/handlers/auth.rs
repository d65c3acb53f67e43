use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{LoginRequest, SessionResponse},
    middleware::AuthUser,
    services::TokenResponse,
    AppState,
};

#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;

    match state.auth.login(&payload.username, &payload.password).await? {
        Some(token) => Ok(Json(token)),
        None => Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid username or password"
        ))),
    }
}

#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, AuthUser(claims): AuthUser) -> StatusCode {
    state.auth.logout(&claims);
    StatusCode::NO_CONTENT
}

pub async fn session(AuthUser(claims): AuthUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: true,
        subject: claims.sub,
        expires_at: DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
    })
}
