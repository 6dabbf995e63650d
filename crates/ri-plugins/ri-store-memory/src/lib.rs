//! # ri-store-memory
//!
//! In-process implementation of `MessageRepo`. Nothing survives a restart;
//! intended for development and tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ri_core::error::{AppError, Result};
use ri_core::models::{InboxStats, Message};
use ri_core::traits::MessageRepo;
use ri_core::validation::{normalize_content, normalize_reply};
use uuid::Uuid;

struct Entry {
    seq: u64,
    message: Message,
}

#[derive(Default)]
pub struct MemoryMessageRepo {
    entries: DashMap<Uuid, Entry>,
    next_seq: AtomicU64,
}

impl MemoryMessageRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts with an explicit creation time, e.g. when importing.
    pub fn insert_at(&self, content: &str, created_at: DateTime<Utc>) -> Result<Message> {
        let message = Message {
            id: Uuid::now_v7(),
            content: normalize_content(content)?,
            created_at,
            is_read: false,
            reply: None,
        };
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(message.id, Entry { seq, message: message.clone() });
        Ok(message)
    }

    /// Snapshot in list order. Sorting happens on every read.
    fn sorted(&self, filter: impl Fn(&Message) -> bool) -> Vec<Message> {
        let mut rows: Vec<(u64, Message)> = self
            .entries
            .iter()
            .filter(|e| filter(&e.message))
            .map(|e| (e.seq, e.message.clone()))
            .collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| b.created_at.cmp(&a.created_at).then(a_seq.cmp(b_seq)));
        rows.into_iter().map(|(_, m)| m).collect()
    }
}

#[async_trait]
impl MessageRepo for MemoryMessageRepo {
    async fn insert(&self, content: &str) -> Result<Message> {
        self.insert_at(content, Utc::now())
    }

    async fn list(&self) -> Result<Vec<Message>> {
        Ok(self.sorted(|_| true))
    }

    async fn get(&self, id: Uuid) -> Result<Message> {
        self.entries
            .get(&id)
            .map(|e| e.message.clone())
            .ok_or_else(|| AppError::message_not_found(id))
    }

    async fn mark_read(&self, id: Uuid) -> Result<Message> {
        let mut entry = self.entries.get_mut(&id).ok_or_else(|| AppError::message_not_found(id))?;
        entry.message.is_read = true;
        Ok(entry.message.clone())
    }

    async fn set_reply(&self, id: Uuid, text: &str) -> Result<Message> {
        let reply = normalize_reply(text)?;
        // Both fields change under the same shard lock.
        let mut entry = self.entries.get_mut(&id).ok_or_else(|| AppError::message_not_found(id))?;
        entry.message.reply = Some(reply);
        entry.message.is_read = true;
        Ok(entry.message.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.entries
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::message_not_found(id))
    }

    async fn list_replied(&self, limit: u32) -> Result<Vec<Message>> {
        let mut replied = self.sorted(Message::is_answered);
        replied.truncate(limit as usize);
        Ok(replied)
    }

    async fn stats(&self) -> Result<InboxStats> {
        let mut stats = InboxStats::default();
        for entry in self.entries.iter() {
            stats.total += 1;
            if !entry.message.is_read {
                stats.unread += 1;
            }
            if entry.message.is_answered() {
                stats.replied += 1;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let repo = MemoryMessageRepo::new();
        let at = Utc::now();
        repo.insert_at("a", at).unwrap();
        repo.insert_at("b", at).unwrap();
        repo.insert_at("newest", at + chrono::Duration::seconds(1)).unwrap();
        repo.insert_at("c", at).unwrap();

        let contents: Vec<String> = repo.list().await.unwrap().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["newest", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_concurrent_replies_last_write_wins_and_stay_read() {
        let repo = Arc::new(MemoryMessageRepo::new());
        let id = repo.insert("hello").await.unwrap().id;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        repo.mark_read(id).await.map(|_| ())
                    } else {
                        repo.set_reply(id, &format!("reply {i}")).await.map(|_| ())
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let message = repo.get(id).await.unwrap();
        assert!(message.is_read);
        let reply = message.reply.expect("some reply won");
        assert!(reply.starts_with("reply "));
    }

    #[tokio::test]
    async fn test_stats_count_each_state() {
        let repo = MemoryMessageRepo::new();
        let a = repo.insert("a").await.unwrap();
        let b = repo.insert("b").await.unwrap();
        repo.insert("c").await.unwrap();
        repo.mark_read(a.id).await.unwrap();
        repo.set_reply(b.id, "ok").await.unwrap();

        assert_eq!(
            repo.stats().await.unwrap(),
            InboxStats { total: 3, unread: 1, replied: 1 }
        );
    }
}
