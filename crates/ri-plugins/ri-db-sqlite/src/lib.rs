//! # ri-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `ri-core` domain models.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ri_core::error::{AppError, Result};
use ri_core::models::{InboxStats, Message};
use ri_core::traits::MessageRepo;
use ri_core::validation::{normalize_content, normalize_reply};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// `seq` records insertion order so that equal timestamps sort stably.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    id            BLOB    NOT NULL UNIQUE,
    content       TEXT    NOT NULL,
    created_at_us INTEGER NOT NULL,
    is_read       INTEGER NOT NULL DEFAULT 0,
    reply         TEXT
);
CREATE INDEX IF NOT EXISTS idx_messages_created ON messages (created_at_us DESC, seq ASC);
";

const COLUMNS: &str = "id, content, created_at_us, is_read, reply";

pub struct SqliteMessageRepo {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Result<Uuid> {
    Uuid::from_slice(blob).map_err(|e| AppError::Store(format!("corrupt message id: {e}")))
}

fn store_error(err: sqlx::Error) -> AppError {
    tracing::error!(error = %err, "sqlite operation failed");
    AppError::Store(err.to_string())
}

fn row_to_message(row: &SqliteRow) -> Result<Message> {
    let micros: i64 = row.try_get("created_at_us").map_err(store_error)?;
    let created_at = DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| AppError::Store(format!("corrupt timestamp: {micros}")))?;

    Ok(Message {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id").map_err(store_error)?.as_slice())?,
        content: row.try_get("content").map_err(store_error)?,
        created_at,
        is_read: row.try_get("is_read").map_err(store_error)?,
        reply: row.try_get("reply").map_err(store_error)?,
    })
}

impl SqliteMessageRepo {
    /// Connects to `url` (e.g. `sqlite:rusty_inbox.db` or `sqlite::memory:`)
    /// and creates the schema if needed.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::with_max_connections(url, 5).await
    }

    pub async fn with_max_connections(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every in-memory connection is its own database; pin to one that never recycles.
        let in_memory = url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { max_connections.max(1) };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            pool_options = pool_options.idle_timeout(None::<Duration>).max_lifetime(None::<Duration>);
        }
        let pool = pool_options.connect_with(options).await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        tracing::info!(url, max_connections, "sqlite message store ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageRepo for SqliteMessageRepo {
    async fn insert(&self, content: &str) -> Result<Message> {
        let content = normalize_content(content)?;
        let message = Message {
            id: Uuid::now_v7(),
            content,
            created_at: Utc::now(),
            is_read: false,
            reply: None,
        };

        sqlx::query("INSERT INTO messages (id, content, created_at_us, is_read, reply) VALUES (?, ?, ?, 0, NULL)")
            .bind(uuid_to_blob(message.id))
            .bind(message.content.as_str())
            .bind(message.created_at.timestamp_micros())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        // Read back so the returned record has the stored precision.
        self.get(message.id).await
    }

    async fn list(&self) -> Result<Vec<Message>> {
        let sql = format!("SELECT {COLUMNS} FROM messages ORDER BY created_at_us DESC, seq ASC");
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?
            .iter()
            .map(row_to_message)
            .collect()
    }

    async fn get(&self, id: Uuid) -> Result<Message> {
        let sql = format!("SELECT {COLUMNS} FROM messages WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => row_to_message(&row),
            None => Err(AppError::message_not_found(id)),
        }
    }

    async fn mark_read(&self, id: Uuid) -> Result<Message> {
        let sql = format!("UPDATE messages SET is_read = 1 WHERE id = ? RETURNING {COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => row_to_message(&row),
            None => Err(AppError::message_not_found(id)),
        }
    }

    /// Single statement, so `reply` and `is_read` can never be observed apart.
    async fn set_reply(&self, id: Uuid, text: &str) -> Result<Message> {
        let reply = normalize_reply(text)?;
        let sql = format!("UPDATE messages SET reply = ?, is_read = 1 WHERE id = ? RETURNING {COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(reply)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => row_to_message(&row),
            None => Err(AppError::message_not_found(id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::message_not_found(id));
        }
        Ok(())
    }

    async fn list_replied(&self, limit: u32) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM messages WHERE reply IS NOT NULL ORDER BY created_at_us DESC, seq ASC LIMIT ?"
        );
        sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?
            .iter()
            .map(row_to_message)
            .collect()
    }

    async fn stats(&self) -> Result<InboxStats> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END), 0) AS unread, \
                    COUNT(reply) AS replied \
             FROM messages",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        let count = |column: &str| -> Result<u64> {
            let value: i64 = row.try_get(column).map_err(store_error)?;
            Ok(u64::try_from(value).unwrap_or_default())
        };

        Ok(InboxStats {
            total: count("total")?,
            unread: count("unread")?,
            replied: count("replied")?,
        })
    }
}
