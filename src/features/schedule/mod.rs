//! # Schedule Feature
//!
//! The core of the bot: turning a free-text schedule message into
//! normalized reminder records and reconciling them against storage.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Storage failures now abort reconciliation instead of being
//!   reported as success
//! - 1.1.0: Change summaries rendered here instead of in the event handler
//! - 1.0.0: Initial release

pub mod parser;
pub mod reconciler;

pub use parser::{ParsedEntry, ReminderParser};
pub use reconciler::{format_changes, ChangeEvent, Reconciler};
