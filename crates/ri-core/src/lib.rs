//! rusty-inbox/crates/ri-core/src/lib.rs
//!
//! The central domain types and interface definitions for Rusty-Inbox.

pub mod models;
pub mod traits;
pub mod error;
pub mod validation;

// Re-exporting for easier access in other crates
pub use models::*;
pub use traits::*;
pub use error::*;
