//! # ri-auth-simple
//!
//! Argon2-based implementation of `CredentialValidator` and an HS256 JWT
//! implementation of `SessionSigner`.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ri_core::error::{AppError, Result};
use ri_core::models::{Session, SessionClaims};
use ri_core::traits::{CredentialValidator, SessionSigner};
use ri_core::validation::{MAX_SECRET_LEN, MIN_SIGNING_KEY_LEN};
use uuid::Uuid;

/// Subject of every session token; there is exactly one operator.
pub const OPERATOR_SUBJECT: &str = "operator";

/// Hashes an operator secret into an Argon2 PHC string suitable for
/// `auth.operator_secret_hash`.
pub fn hash_secret(secret: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash secret: {e}"))?;
    Ok(hash.to_string())
}

/// Verifies operator secrets against a stored Argon2 hash.
pub struct Argon2CredentialValidator {
    reference_hash: Arc<str>,
}

impl Argon2CredentialValidator {
    /// Accepts the PHC hash string (e.g., from configuration).
    ///
    /// The hash is parsed lazily so that a broken reference surfaces as
    /// `AppError::Auth` on the first login rather than as a silent rejection.
    pub fn new(reference_hash: &str) -> Self {
        Self {
            reference_hash: Arc::from(reference_hash),
        }
    }
}

#[async_trait]
impl CredentialValidator for Argon2CredentialValidator {
    async fn validate(&self, secret: &str) -> Result<bool> {
        if secret.is_empty() || secret.len() > MAX_SECRET_LEN {
            return Ok(false);
        }

        let reference = Arc::clone(&self.reference_hash);
        let secret = secret.to_owned();

        // Argon2 is deliberately slow; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&reference).map_err(|e| {
                tracing::error!(error = %e, "configured operator secret hash is not a valid PHC string");
                AppError::Auth("operator secret hash is misconfigured".to_string())
            })?;
            Ok(Argon2::default()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(|e| AppError::Auth(format!("credential check aborted: {e}")))?
    }
}

/// Signs operator sessions as HS256 JWTs with a fixed TTL.
pub struct JwtSessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    issuer: String,
}

impl JwtSessionSigner {
    pub fn new(signing_key: &[u8], ttl: Duration, issuer: impl Into<String>) -> anyhow::Result<Self> {
        if signing_key.len() < MIN_SIGNING_KEY_LEN {
            anyhow::bail!(
                "session signing key must be at least {MIN_SIGNING_KEY_LEN} bytes, got {}",
                signing_key.len()
            );
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            ttl,
            issuer: issuer.into(),
        })
    }
}

impl SessionSigner for JwtSessionSigner {
    fn issue(&self, now: DateTime<Utc>) -> Result<(Session, SessionClaims)> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: OPERATOR_SUBJECT.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Auth(format!("failed to sign session: {e}")))?;

        Ok((Session { token, expires_at }, claims))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by the session gate against its own clock.
        validation.validate_exp = false;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("invalid session token: {e}")))?;

        if data.claims.sub != OPERATOR_SUBJECT {
            return Err(AppError::Unauthorized("unknown session subject".to_string()));
        }
        Ok(data.claims)
    }
}
