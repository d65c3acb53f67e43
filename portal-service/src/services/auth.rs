use chrono::Utc;
use dashmap::DashMap;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::services::jwt::{AccessTokenClaims, TokenResponse, TokenService};
use crate::services::metrics;
use crate::utils::password::verify_password;

/// Session gate for the single configured operator.
pub struct Authenticator {
    username: String,
    password_hash: Secret<String>,
    tokens: TokenService,
    login_delay: Duration,
    /// Revoked token ids mapped to their expiry (Unix seconds).
    revoked: DashMap<String, i64>,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password_hash: config.password_hash.clone(),
            tokens: TokenService::new(config.jwt_secret.expose_secret(), config.token_ttl_minutes),
            login_delay: Duration::from_millis(config.login_delay_ms),
            revoked: DashMap::new(),
        }
    }

    /// Check a username/password pair and issue a token.
    ///
    /// `Ok(None)` means the credentials were wrong. Errors are reserved for
    /// internal failures such as an unreadable stored hash.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<TokenResponse>, AppError> {
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        let username_matches: bool = username
            .as_bytes()
            .ct_eq(self.username.as_bytes())
            .into();

        // The hash is checked even for an unknown username so both paths cost the same.
        let password = password.to_string();
        let hash = self.password_hash.expose_secret().clone();
        let password_matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password check panicked: {}", e)))?
            .map_err(|e| {
                tracing::error!("Configured password hash is unusable: {}", e);
                AppError::InternalError(e)
            })?;

        if !(username_matches && password_matches) {
            metrics::record_login("rejected");
            tracing::warn!("Login rejected");
            return Ok(None);
        }

        let token = self
            .tokens
            .generate_access_token(&self.username)
            .map_err(AppError::InternalError)?;

        metrics::record_login("accepted");
        tracing::info!(subject = %self.username, "Operator logged in");
        Ok(Some(self.tokens.token_response(token)))
    }

    /// Validate signature and expiry, then reject revoked tokens.
    pub fn authenticate(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let claims = self.tokens.validate_access_token(token)?;

        if self.revoked.contains_key(&claims.jti) {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Token has been revoked"
            )));
        }

        Ok(claims)
    }

    /// Revoke the token until it would have expired anyway.
    pub fn logout(&self, claims: &AccessTokenClaims) {
        self.purge_expired();
        self.revoked.insert(claims.jti.clone(), claims.exp);
        tracing::info!(subject = %claims.sub, "Token revoked");
    }

    pub fn token_ttl_seconds(&self) -> i64 {
        self.tokens.access_token_expiry_seconds()
    }

    fn purge_expired(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::password::hash_password_with_cost;

    fn authenticator() -> Authenticator {
        Authenticator::new(&AuthConfig {
            username: "admin".to_string(),
            password_hash: Secret::new(hash_password_with_cost("letmein", 1024, 1).unwrap()),
            jwt_secret: Secret::new("unit-test-secret".to_string()),
            token_ttl_minutes: 60,
            login_delay_ms: 0,
            secure_cookies: false,
        })
    }

    #[tokio::test]
    async fn correct_credentials_issue_token() {
        let auth = authenticator();
        let response = auth.login("admin", "letmein").await.unwrap().unwrap();
        assert_eq!(response.token_type, "Bearer");

        let claims = auth.authenticate(&response.access_token).unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[tokio::test]
    async fn wrong_password_or_username_is_none() {
        let auth = authenticator();
        assert!(auth.login("admin", "nope").await.unwrap().is_none());
        assert!(auth.login("root", "letmein").await.unwrap().is_none());
        assert!(auth.login("", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unusable_hash_is_an_internal_error() {
        let auth = Authenticator::new(&AuthConfig {
            username: "admin".to_string(),
            password_hash: Secret::new("not-a-hash".to_string()),
            jwt_secret: Secret::new("s".to_string()),
            token_ttl_minutes: 60,
            login_delay_ms: 0,
            secure_cookies: false,
        });
        let err = auth.login("admin", "letmein").await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[tokio::test]
    async fn logged_out_token_is_rejected() {
        let auth = authenticator();
        let token = auth.login("admin", "letmein").await.unwrap().unwrap().access_token;
        let claims = auth.authenticate(&token).unwrap();

        auth.logout(&claims);

        assert!(matches!(
            auth.authenticate(&token).unwrap_err(),
            AppError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn logout_purges_expired_revocations() {
        let auth = authenticator();
        auth.revoked.insert("stale".to_string(), Utc::now().timestamp() - 10);

        let token = auth.login("admin", "letmein").await.unwrap().unwrap().access_token;
        auth.logout(&auth.authenticate(&token).unwrap());

        assert!(!auth.revoked.contains_key("stale"));
        assert_eq!(auth.revoked.len(), 1);
    }

    #[test]
    fn garbage_token_is_invalid() {
        let auth = authenticator();
        assert!(matches!(
            auth.authenticate("not.a.jwt").unwrap_err(),
            AppError::InvalidToken(_)
        ));
    }
}
