//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Inbox.
//! We use UUID v7 for time-ordered, globally unique identification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// One anonymously submitted message, with an optional operator reply.
///
/// Carries no information about the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// Trimmed submission text, 1..=500 characters
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Monotonic: never goes back to false
    pub is_read: bool,
    pub reply: Option<String>,
}

impl Message {
    pub fn is_answered(&self) -> bool {
        self.reply.is_some()
    }
}

/// The only view of a message the public feed is allowed to expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicReply {
    pub content: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

impl PublicReply {
    /// Returns `None` for unanswered messages.
    pub fn from_message(message: Message) -> Option<Self> {
        let reply = message.reply?;
        Some(Self {
            content: message.content,
            reply,
            created_at: message.created_at,
        })
    }
}

/// Counters shown on the operator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxStats {
    pub total: u64,
    pub unread: u64,
    pub replied: u64,
}

/// A server-issued operator session: a signed bearer token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Always the single operator identity
    pub sub: String,
    /// Unique per token, used for revocation on logout
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(Session),
    /// Wrong secret. No session was issued.
    AuthFailed,
}
