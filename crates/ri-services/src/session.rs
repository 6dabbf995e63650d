//! Operator session gate.
//!
//! A successful credential check yields a signed, expiring bearer token.
//! Every privileged call presents the token again and is checked for
//! signature, expiry and revocation. Logout revokes the token's `jti` until
//! the token would have expired anyway.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ri_core::error::{AppError, Result};
use ri_core::models::{SessionClaims, SessionState};
use ri_core::traits::{CredentialValidator, SessionSigner};

pub struct SessionGate {
    validator: Arc<dyn CredentialValidator>,
    signer: Arc<dyn SessionSigner>,
    /// jti -> exp (unix seconds)
    revoked: DashMap<String, i64>,
    auth_timeout: Duration,
}

impl SessionGate {
    pub fn new(
        validator: Arc<dyn CredentialValidator>,
        signer: Arc<dyn SessionSigner>,
        auth_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            signer,
            revoked: DashMap::new(),
            auth_timeout,
        }
    }

    /// Checks `secret` and, on success, issues a new session.
    ///
    /// A wrong secret is `Ok(SessionState::AuthFailed)`. A validator that
    /// fails or does not answer in time is `Err(AppError::Auth)`.
    pub async fn authenticate(&self, secret: &str) -> Result<SessionState> {
        if secret.trim().is_empty() {
            return Err(AppError::ValidationError("secret must not be empty".to_string()));
        }

        let accepted = match tokio::time::timeout(self.auth_timeout, self.validator.validate(secret)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(timeout_ms = self.auth_timeout.as_millis() as u64, "credential check timed out");
                return Err(AppError::Auth("credential check timed out".to_string()));
            }
        };

        if !accepted {
            tracing::warn!("operator login rejected");
            return Ok(SessionState::AuthFailed);
        }

        let (session, claims) = self.signer.issue(Utc::now())?;
        tracing::info!(jti = %claims.jti, expires_at = %session.expires_at, "operator session issued");
        Ok(SessionState::Authenticated(session))
    }

    pub fn is_authenticated(&self, token: &str) -> bool {
        self.require(token).is_ok()
    }

    /// Returns the token's claims if it is a live session, `Unauthorized` otherwise.
    pub fn require(&self, token: &str) -> Result<SessionClaims> {
        self.check_at(token, Utc::now())
    }

    fn check_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims> {
        if token.is_empty() {
            return Err(AppError::Unauthorized("missing session token".to_string()));
        }

        let claims = self.signer.verify(token).map_err(|e| match e {
            AppError::Unauthorized(_) => e,
            other => AppError::Unauthorized(other.to_string()),
        })?;

        if claims.exp <= now.timestamp() {
            return Err(AppError::Unauthorized("session expired".to_string()));
        }
        if self.revoked.contains_key(&claims.jti) {
            return Err(AppError::Unauthorized("session revoked".to_string()));
        }
        Ok(claims)
    }

    /// Ends the session carried by `token`. Idempotent; tokens that do not
    /// verify are ignored.
    pub fn logout(&self, token: &str) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);

        if let Ok(claims) = self.signer.verify(token) {
            if claims.exp > now && self.revoked.insert(claims.jti.clone(), claims.exp).is_none() {
                tracing::info!(jti = %claims.jti, "operator session revoked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ri_auth_simple::JwtSessionSigner;
    use ri_core::traits::MockCredentialValidator;

    const KEY: &[u8] = b"an-operator-signing-key-of-32-bytes!";

    fn signer(ttl: chrono::Duration) -> Arc<dyn SessionSigner> {
        Arc::new(JwtSessionSigner::new(KEY, ttl, "rusty-inbox").unwrap())
    }

    fn gate_with(validator: MockCredentialValidator, ttl: chrono::Duration) -> SessionGate {
        SessionGate::new(Arc::new(validator), signer(ttl), Duration::from_secs(5))
    }

    fn accepting(secret: &'static str) -> MockCredentialValidator {
        let mut validator = MockCredentialValidator::new();
        validator.expect_validate().returning(move |s| Ok(s == secret));
        validator
    }

    async fn login(gate: &SessionGate, secret: &str) -> String {
        match gate.authenticate(secret).await.unwrap() {
            SessionState::Authenticated(session) => session.token,
            SessionState::AuthFailed => panic!("expected login to succeed"),
        }
    }

    #[tokio::test]
    async fn test_correct_secret_issues_live_session() {
        let gate = gate_with(accepting("hunter2"), chrono::Duration::hours(8));
        let token = login(&gate, "hunter2").await;

        assert!(gate.is_authenticated(&token));
        assert_eq!(gate.require(&token).unwrap().sub, "operator");
    }

    #[tokio::test]
    async fn test_wrong_secret_is_auth_failed_and_grants_nothing() {
        let gate = gate_with(accepting("hunter2"), chrono::Duration::hours(8));

        assert_eq!(gate.authenticate("wrong").await, Ok(SessionState::AuthFailed));
        assert!(!gate.is_authenticated(""));
        assert!(matches!(gate.require(""), Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_blank_secret_never_reaches_validator() {
        let mut validator = MockCredentialValidator::new();
        validator.expect_validate().never();
        let gate = gate_with(validator, chrono::Duration::hours(8));

        assert!(matches!(gate.authenticate("   ").await, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_broken_validator_is_distinct_from_wrong_secret() {
        let mut validator = MockCredentialValidator::new();
        validator
            .expect_validate()
            .returning(|_| Err(AppError::Auth("hash misconfigured".to_string())));
        let gate = gate_with(validator, chrono::Duration::hours(8));

        assert!(matches!(gate.authenticate("anything").await, Err(AppError::Auth(_))));
    }

    struct StalledValidator;

    #[async_trait]
    impl CredentialValidator for StalledValidator {
        async fn validate(&self, _secret: &str) -> Result<bool> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(true)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_validator_timeout_is_auth_error() {
        let gate = SessionGate::new(
            Arc::new(StalledValidator),
            signer(chrono::Duration::hours(8)),
            Duration::from_millis(100),
        );
        assert_eq!(
            gate.authenticate("hunter2").await,
            Err(AppError::Auth("credential check timed out".to_string()))
        );
    }

    #[tokio::test]
    async fn test_logout_revokes_only_that_session() {
        let gate = gate_with(accepting("hunter2"), chrono::Duration::hours(8));
        let first = login(&gate, "hunter2").await;
        let second = login(&gate, "hunter2").await;

        gate.logout(&first);
        assert!(!gate.is_authenticated(&first));
        assert!(gate.is_authenticated(&second));

        // Idempotent, and junk is ignored.
        gate.logout(&first);
        gate.logout("not-a-token");
        gate.logout("");
        assert!(matches!(gate.require(&first), Err(AppError::Unauthorized(m)) if m == "session revoked"));
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthorized() {
        let gate = gate_with(accepting("hunter2"), chrono::Duration::zero());
        let token = login(&gate, "hunter2").await;

        assert!(matches!(gate.require(&token), Err(AppError::Unauthorized(m)) if m == "session expired"));
    }

    #[tokio::test]
    async fn test_session_expires_after_ttl() {
        let gate = gate_with(accepting("hunter2"), chrono::Duration::minutes(30));
        let token = login(&gate, "hunter2").await;

        assert!(gate.check_at(&token, Utc::now() + chrono::Duration::minutes(29)).is_ok());
        assert!(gate.check_at(&token, Utc::now() + chrono::Duration::minutes(31)).is_err());
    }

    #[tokio::test]
    async fn test_token_from_another_signer_is_rejected() {
        let gate = gate_with(accepting("hunter2"), chrono::Duration::hours(8));
        let stranger = JwtSessionSigner::new(b"a-completely-different-signing-key!!", chrono::Duration::hours(8), "rusty-inbox").unwrap();
        let (forged, _) = stranger.issue(Utc::now()).unwrap();

        assert!(!gate.is_authenticated(&forged.token));
    }
}
