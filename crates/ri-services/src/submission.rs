//! Public write path: anyone may submit a message, no session required.

use std::sync::Arc;
use std::time::Duration;

use ri_core::error::Result;
use ri_core::traits::MessageRepo;
use ri_core::validation::normalize_content;
use uuid::Uuid;

use crate::within_store_deadline;

#[derive(Clone)]
pub struct SubmissionService {
    repo: Arc<dyn MessageRepo>,
    store_timeout: Duration,
}

impl SubmissionService {
    pub fn new(repo: Arc<dyn MessageRepo>, store_timeout: Duration) -> Self {
        Self { repo, store_timeout }
    }

    /// Stores `content` as a new anonymous message and returns its id.
    ///
    /// Invalid content is rejected here before the store sees it; the store
    /// validates again on insert.
    pub async fn submit(&self, content: &str) -> Result<Uuid> {
        let content = normalize_content(content)?;
        let message = within_store_deadline(self.store_timeout, "insert", self.repo.insert(&content)).await?;
        tracing::info!(message_id = %message.id, "anonymous message received");
        Ok(message.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ri_core::error::AppError;
    use ri_core::traits::MockMessageRepo;
    use ri_store_memory::MemoryMessageRepo;

    fn service(repo: impl MessageRepo + 'static) -> SubmissionService {
        SubmissionService::new(Arc::new(repo), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_submit_stores_one_unread_message() {
        let repo = Arc::new(MemoryMessageRepo::new());
        let svc = SubmissionService::new(repo.clone(), Duration::from_secs(5));

        let id = svc.submit("Hello").await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].content, "Hello");
        assert!(!all[0].is_read);
        assert_eq!(all[0].reply, None);
    }

    #[tokio::test]
    async fn test_identical_submissions_are_not_merged() {
        let repo = Arc::new(MemoryMessageRepo::new());
        let svc = SubmissionService::new(repo.clone(), Duration::from_secs(5));

        let a = svc.submit("same").await.unwrap();
        let b = svc.submit("same").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_content_fails_before_the_store() {
        let mut repo = MockMessageRepo::new();
        repo.expect_insert().never();
        let svc = service(repo);

        assert!(matches!(svc.submit("").await, Err(AppError::ValidationError(_))));
        assert!(matches!(svc.submit(&"x".repeat(501)).await, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let mut repo = MockMessageRepo::new();
        repo.expect_insert()
            .returning(|_| Err(AppError::Store("disk full".to_string())));
        let svc = service(repo);

        assert!(matches!(svc.submit("hi").await, Err(AppError::Store(_))));
    }
}
