//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{InboxStats, Message, Session, SessionClaims};

/// Data persistence contract for messages.
///
/// Implementations re-validate all text they accept and must be safe to call
/// concurrently: `mark_read` converges to `is_read = true`, and `set_reply` is
/// last-write-wins on `reply` with `is_read` set in the same operation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    /// Stores a new unread, unanswered message.
    async fn insert(&self, content: &str) -> Result<Message>;

    /// All messages, newest first; equal timestamps keep insertion order.
    async fn list(&self) -> Result<Vec<Message>>;
    async fn get(&self, id: Uuid) -> Result<Message>;

    /// Idempotent. Returns the current record.
    async fn mark_read(&self, id: Uuid) -> Result<Message>;

    /// Sets `reply` and `is_read = true` atomically.
    async fn set_reply(&self, id: Uuid, text: &str) -> Result<Message>;
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Answered messages only, in `list` order, at most `limit` of them.
    async fn list_replied(&self, limit: u32) -> Result<Vec<Message>>;
    async fn stats(&self) -> Result<InboxStats>;
}

/// Checks a submitted operator secret against the configured reference.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// `Ok(false)` is a wrong secret; `Err(AppError::Auth)` means the
    /// validator itself could not run.
    async fn validate(&self, secret: &str) -> Result<bool>;
}

/// Issues and verifies signed operator session tokens.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionSigner: Send + Sync {
    fn issue(&self, now: DateTime<Utc>) -> Result<(Session, SessionClaims)>;

    /// Checks the signature and issuer only. Expiry and revocation are the
    /// caller's concern.
    fn verify(&self, token: &str) -> Result<SessionClaims>;
}
