//! Shared fixtures for the integration test binaries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ri_auth_simple::JwtSessionSigner;
use ri_core::error::Result;
use ri_core::models::SessionState;
use ri_core::traits::{CredentialValidator, MessageRepo};
use ri_db_sqlite::SqliteMessageRepo;
use ri_services::{FeedLimits, ModerationService, ReplyFeed, SessionGate, SubmissionService};
use ri_store_memory::MemoryMessageRepo;

pub const OPERATOR_SECRET: &str = "AdminPassword123456789012345678";

/// Exact-match validator; keeps Argon2 cost out of the suites.
pub struct FixedSecret(pub &'static str);

#[async_trait]
impl CredentialValidator for FixedSecret {
    async fn validate(&self, secret: &str) -> Result<bool> {
        Ok(secret == self.0)
    }
}

/// Every store backend the contract suite runs against.
pub async fn all_stores() -> Vec<(&'static str, Arc<dyn MessageRepo>)> {
    let sqlite = SqliteMessageRepo::new("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    vec![
        ("sqlite", Arc::new(sqlite) as Arc<dyn MessageRepo>),
        ("memory", Arc::new(MemoryMessageRepo::new()) as Arc<dyn MessageRepo>),
    ]
}

pub struct Inbox {
    pub submissions: SubmissionService,
    pub moderation: ModerationService,
    pub feed: ReplyFeed,
    pub gate: Arc<SessionGate>,
}

impl Inbox {
    pub fn over(repo: Arc<dyn MessageRepo>) -> Self {
        let timeout = Duration::from_secs(5);
        let signer = JwtSessionSigner::new(
            b"integration-signing-key-0123456789abcdef",
            chrono::Duration::hours(8),
            "rusty-inbox",
        )
        .expect("valid signing key");
        let gate = Arc::new(SessionGate::new(
            Arc::new(FixedSecret(OPERATOR_SECRET)),
            Arc::new(signer),
            timeout,
        ));
        Self {
            submissions: SubmissionService::new(repo.clone(), timeout),
            moderation: ModerationService::new(repo.clone(), gate.clone(), timeout),
            feed: ReplyFeed::new(repo, FeedLimits::default(), timeout),
            gate,
        }
    }

    pub async fn operator_token(&self) -> String {
        match self.gate.authenticate(OPERATOR_SECRET).await.expect("validator works") {
            SessionState::Authenticated(session) => session.token,
            SessionState::AuthFailed => panic!("operator secret rejected"),
        }
    }
}
