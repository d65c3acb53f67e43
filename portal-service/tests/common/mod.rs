//! Test helpers for portal-service integration tests.
//!
//! Every test gets its own router over in-memory repositories, so nothing
//! here needs a running MongoDB.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use portal_service::config::{
    AuthConfig, ObservabilityConfig, PortalConfig, StorageBackend, StorageConfig,
};
use portal_service::utils::password::hash_password_with_cost;
use portal_service::{build_router, AppState};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::ServerConfig;
use tower::util::ServiceExt;

pub const OPERATOR: &str = "admin";
pub const PASSWORD: &str = "correct horse battery staple";

// Hashing once keeps the suite fast; low cost parameters are fine for tests.
static PASSWORD_HASH: Lazy<String> = Lazy::new(|| {
    hash_password_with_cost(PASSWORD, 1024, 1).expect("Failed to hash test password")
});

pub fn test_config() -> PortalConfig {
    PortalConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        },
        auth: AuthConfig {
            username: OPERATOR.to_string(),
            password_hash: Secret::new(PASSWORD_HASH.clone()),
            jwt_secret: Secret::new("integration-test-secret".to_string()),
            token_ttl_minutes: 60,
            login_delay_ms: 0,
            secure_cookies: false,
        },
        observability: ObservabilityConfig {
            log_level: "warn".to_string(),
            otlp_endpoint: None,
        },
    }
}

/// A router plus the state behind it, so tests can seed or inspect records
/// directly.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn spawn() -> Self {
        let state = AppState::in_memory(test_config());
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed to respond")
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(json_request("GET", uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.send(json_request("POST", uri, token, Some(body))).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.send(json_request("PUT", uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(json_request("DELETE", uri, token, None)).await
    }

    /// Log in over the JSON API and return the bearer token.
    pub async fn login(&self) -> String {
        let response = self
            .post_json(
                "/auth/login",
                None,
                serde_json::json!({ "username": OPERATOR, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        body["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }

    /// Create an event over the JSON API and return its hex id.
    pub async fn create_event(&self, token: &str, body: Value) -> String {
        let response = self.post_json("/events", Some(token), body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let ack = body_json(response).await;
        ack["inserted_id"]
            .as_str()
            .expect("inserted_id missing")
            .to_string()
    }

    pub async fn event(&self, token: &str, id: &str) -> Value {
        let response = self.get(&format!("/events/{}", id), Some(token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    /// Submit an HTML form, carrying the session cookie when given.
    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get_page(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Sign in through the login form and return the session cookie.
    pub async fn sign_in(&self) -> String {
        let body = format!(
            "username={}&password={}",
            OPERATOR,
            PASSWORD.replace(' ', "+")
        );
        let response = self.post_form("/login", None, &body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login did not set a session cookie")
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body was not JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("Body was not UTF-8")
}

/// `name=value` of the first Set-Cookie header, ready for a Cookie header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub fn wedding() -> Value {
    serde_json::json!({
        "date": "2024-06-15",
        "name": "Khan Wedding",
        "type": "wedding",
        "expenses": [
            { "description": "Flowers", "amount": 100 },
            { "description": "Lights", "amount": 50.5 }
        ]
    })
}

pub fn invoice(number: &str) -> Value {
    serde_json::json!({
        "invoice_number": number,
        "client_name": "Sara Ahmed",
        "client_phone": "555-0101",
        "items": [
            { "description": "Stage", "quantity": 2, "rate": 50 },
            { "description": "Lights", "quantity": 1, "rate": 30 }
        ],
        "discount": 10
    })
}
