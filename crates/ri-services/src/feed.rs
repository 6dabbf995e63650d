//! Public reply feed: answered messages only, newest first, bounded.

use std::sync::Arc;
use std::time::Duration;

use ri_core::error::Result;
use ri_core::models::PublicReply;
use ri_core::traits::MessageRepo;

use crate::within_store_deadline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLimits {
    /// Used when the caller gives no limit
    pub default_limit: u32,
    /// Hard cap on any requested limit
    pub max_limit: u32,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self { default_limit: 10, max_limit: 50 }
    }
}

impl FeedLimits {
    fn resolve(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

#[derive(Clone)]
pub struct ReplyFeed {
    repo: Arc<dyn MessageRepo>,
    limits: FeedLimits,
    store_timeout: Duration,
}

impl ReplyFeed {
    pub fn new(repo: Arc<dyn MessageRepo>, limits: FeedLimits, store_timeout: Duration) -> Self {
        Self { repo, limits, store_timeout }
    }

    pub async fn recent(&self, limit: Option<u32>) -> Result<Vec<PublicReply>> {
        let limit = self.limits.resolve(limit);
        let messages = within_store_deadline(self.store_timeout, "list_replied", self.repo.list_replied(limit)).await?;

        // Filter again here: unanswered messages must never leave through this path.
        Ok(messages
            .into_iter()
            .filter_map(PublicReply::from_message)
            .take(limit as usize)
            .collect())
    }
}
