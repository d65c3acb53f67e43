use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::middleware::{session_claims, SESSION_TOKEN_KEY};
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn login_failed(status: StatusCode, username: String, message: &str) -> Response {
    (
        status,
        LoginTemplate {
            username,
            error: Some(message.to_string()),
        },
    )
        .into_response()
}

pub async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    if session_claims(&state, &session).await.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    LoginTemplate {
        username: String::new(),
        error: None,
    }
    .into_response()
}

#[tracing::instrument(skip_all)]
pub async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return login_failed(
            StatusCode::UNPROCESSABLE_ENTITY,
            form.username,
            "Please enter your username and password",
        );
    }

    match state.auth.login(form.username.trim(), &form.password).await {
        Ok(Some(token)) => {
            // New session id on privilege change.
            if let Err(e) = session.cycle_id().await {
                tracing::error!("Failed to rotate session id: {}", e);
                return login_failed(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    form.username,
                    "An error occurred during login",
                );
            }
            if let Err(e) = session.insert(SESSION_TOKEN_KEY, token.access_token).await {
                tracing::error!("Failed to store session token: {}", e);
                return login_failed(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    form.username,
                    "An error occurred during login",
                );
            }
            Redirect::to("/dashboard").into_response()
        }
        Ok(None) => login_failed(
            StatusCode::UNAUTHORIZED,
            form.username,
            "Invalid username or password",
        ),
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            login_failed(
                StatusCode::INTERNAL_SERVER_ERROR,
                form.username,
                "An error occurred during login",
            )
        }
    }
}

/// Revoke the session's token and clear the session.
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Some(claims) = session_claims(&state, &session).await {
        state.auth.logout(&claims);
    }
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to clear session: {}", e);
    }
    Redirect::to("/")
}
