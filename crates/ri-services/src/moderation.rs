//! Privileged read/update/delete path.
//!
//! Every operation checks the caller's session first; an unauthorized call
//! never reaches the store.

use std::sync::Arc;
use std::time::Duration;

use ri_core::error::Result;
use ri_core::models::{InboxStats, Message};
use ri_core::traits::MessageRepo;
use uuid::Uuid;

use crate::session::SessionGate;
use crate::within_store_deadline;

#[derive(Clone)]
pub struct ModerationService {
    repo: Arc<dyn MessageRepo>,
    gate: Arc<SessionGate>,
    store_timeout: Duration,
}

impl ModerationService {
    pub fn new(repo: Arc<dyn MessageRepo>, gate: Arc<SessionGate>, store_timeout: Duration) -> Self {
        Self { repo, gate, store_timeout }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<Message>> {
        self.gate.require(token)?;
        within_store_deadline(self.store_timeout, "list", self.repo.list()).await
    }

    pub async fn get(&self, token: &str, id: Uuid) -> Result<Message> {
        self.gate.require(token)?;
        within_store_deadline(self.store_timeout, "get", self.repo.get(id)).await
    }

    pub async fn mark_read(&self, token: &str, id: Uuid) -> Result<Message> {
        self.gate.require(token)?;
        let message = within_store_deadline(self.store_timeout, "mark_read", self.repo.mark_read(id)).await?;
        tracing::debug!(message_id = %id, "message marked read");
        Ok(message)
    }

    pub async fn set_reply(&self, token: &str, id: Uuid, text: &str) -> Result<Message> {
        self.gate.require(token)?;
        let message = within_store_deadline(self.store_timeout, "set_reply", self.repo.set_reply(id, text)).await?;
        tracing::info!(message_id = %id, "reply saved");
        Ok(message)
    }

    /// `NotFound` on a repeated delete is expected and harmless to callers.
    pub async fn delete(&self, token: &str, id: Uuid) -> Result<()> {
        self.gate.require(token)?;
        within_store_deadline(self.store_timeout, "delete", self.repo.delete(id)).await?;
        tracing::info!(message_id = %id, "message deleted");
        Ok(())
    }

    pub async fn stats(&self, token: &str) -> Result<InboxStats> {
        self.gate.require(token)?;
        within_store_deadline(self.store_timeout, "stats", self.repo.stats()).await
    }
}
