use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use service_core::error::AppError;
use tower_sessions::Session;

use crate::services::AccessTokenClaims;
use crate::AppState;

/// Session key holding the operator's access token on the HTML surface.
pub const SESSION_TOKEN_KEY: &str = "access_token";

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Require a valid, unrevoked bearer token on JSON routes.
pub async fn require_bearer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = bearer_token(&parts).ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!(
            "Missing or invalid Authorization header"
        ))
    })?;
    let claims = state.auth.authenticate(token)?;

    parts.extensions.insert(claims);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Claims of the operator signed in on this browser session, if any.
pub async fn session_claims(state: &AppState, session: &Session) -> Option<AccessTokenClaims> {
    let token = match session.get::<String>(SESSION_TOKEN_KEY).await {
        Ok(token) => token?,
        Err(e) => {
            tracing::warn!("Failed to read session: {}", e);
            return None;
        }
    };

    match state.auth.authenticate(&token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Session token rejected: {}", e);
            None
        }
    }
}

/// Gate for dashboard pages: anyone without a live session goes back to the
/// login screen.
pub async fn require_session(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Response {
    match session_claims(&state, &session).await {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => {
            if let Err(e) = session.flush().await {
                tracing::warn!("Failed to clear session: {}", e);
            }
            Redirect::to("/").into_response()
        }
    }
}

/// Claims placed on the request by [`require_bearer`] or [`require_session`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessTokenClaims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Not authenticated")))
    }
}
