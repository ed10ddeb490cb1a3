// Core layer - shared domain types and configuration
pub mod core;

// Features layer - parsing, reconciliation, dispatch, supporting caches
pub mod features;

// Infrastructure - persistent reminder/token storage
pub mod database;

// Slack adapter - Web API client, inbound events, OAuth, client registry
pub mod slack;

// Application layer - inbound event orchestration
pub mod handler;

// Re-export core items
pub use crate::core::{Config, ReminderRecord};

// Re-export feature items
pub use features::{
    // Schedule parsing + reconciliation
    ChangeEvent, ParsedEntry, Reconciler, ReminderParser,
    // Daily dispatch
    DailyDispatcher,
    // Idempotency
    EventDeduper,
    // Channel bootstrap
    ChannelDirectory, ChannelRole, Notifier,
};

// Re-export adapter items
pub use slack::{ChatClient, ClientProvider, ClientRegistry, SlackClient, SlackNotifier};

pub use handler::EventHandler;
