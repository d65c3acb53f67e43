pub mod auth;

pub use auth::{require_bearer, require_session, session_claims, AuthUser, SESSION_TOKEN_KEY};
