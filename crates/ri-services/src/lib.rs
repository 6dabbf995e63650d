//! # ri-services
//!
//! The application façades that sit between the HTTP layer and the ports:
//! public submission, the public reply feed, the operator session gate, and
//! operator moderation.

pub mod feed;
pub mod moderation;
pub mod session;
pub mod submission;

pub use feed::{FeedLimits, ReplyFeed};
pub use moderation::ModerationService;
pub use session::SessionGate;
pub use submission::SubmissionService;

use std::future::Future;
use std::time::Duration;

use ri_core::error::{AppError, Result};

/// Runs a store round trip, turning an elapsed deadline into `AppError::Store`.
pub(crate) async fn within_store_deadline<T>(
    deadline: Duration,
    op: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(op, timeout_ms = deadline.as_millis() as u64, "store operation timed out");
            Err(AppError::Store(format!("{op} timed out")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_is_store_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        };
        let result = within_store_deadline(Duration::from_millis(50), "list", slow).await;
        assert_eq!(result, Err(AppError::Store("list timed out".to_string())));
    }

    #[tokio::test]
    async fn test_inner_errors_pass_through() {
        let failing = async { Err::<(), _>(AppError::message_not_found("x")) };
        let result = within_store_deadline(Duration::from_secs(1), "get", failing).await;
        assert!(matches!(result, Err(AppError::NotFound(..))));
    }
}
