//! # Core Module
//!
//! Core domain types, configuration, and outbound message helpers for the
//! reminder bot.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add response module with Slack message chunking utilities
//! - 1.0.0: Initial creation with config and record modules

pub mod config;
pub mod record;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use record::{date_key, ReminderRecord};
pub use response::{split_for_post, truncate_for_post, POST_LIMIT};
