//! # Features Module
//!
//! Feature modules for the reminder bot: the schedule parsing and
//! reconciliation core, the daily dispatch sweep, and the supporting
//! caches around them.

pub mod channels;
pub mod dedup;
pub mod dispatch;
pub mod schedule;

// Re-export feature items
pub use channels::{ChannelDirectory, ChannelRole, Notifier};
pub use dedup::EventDeduper;
pub use dispatch::DailyDispatcher;
pub use schedule::{ChangeEvent, ParsedEntry, Reconciler, ReminderParser};
