//! Input limits shared by every layer that accepts user text.
//!
//! The submission service checks these before calling the store, and each
//! store checks them again on insert.

use crate::error::{AppError, Result};

/// Maximum message length, in characters, after trimming.
pub const MAX_CONTENT_CHARS: usize = 500;

/// Maximum operator reply length, in characters, after trimming.
pub const MAX_REPLY_CHARS: usize = 2000;

/// Secrets longer than this (in bytes) are rejected without hashing.
pub const MAX_SECRET_LEN: usize = 256;

/// Minimum HS256 session signing key length, in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Trims `raw` and checks it is a storable message body.
pub fn normalize_content(raw: &str) -> Result<String> {
    normalize(raw, "message", MAX_CONTENT_CHARS)
}

/// Trims `raw` and checks it is a storable reply.
pub fn normalize_reply(raw: &str) -> Result<String> {
    normalize(raw, "reply", MAX_REPLY_CHARS)
}

fn normalize(raw: &str, what: &str, max_chars: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{what} must not be empty")));
    }
    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(AppError::ValidationError(format!(
            "{what} is {len} characters, maximum is {max_chars}"
        )));
    }
    Ok(trimmed.to_string())
}
