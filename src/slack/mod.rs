//! # Slack Adapter
//!
//! Everything that talks to Slack lives here: the Web API client, the
//! inbound event payload types, the OAuth code exchange, and the per-team
//! client registry. The rest of the crate only sees the [`ChatClient`],
//! [`ClientProvider`], and [`crate::features::channels::Notifier`] seams.

pub mod client;
pub mod events;
pub mod oauth;
pub mod registry;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::core::split_for_post;
use crate::features::channels::{ChannelDirectory, ChannelRole, Notifier};

pub use client::SlackClient;
pub use registry::ClientRegistry;

/// A public or private conversation
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

/// A workspace member
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_app_user: bool,
}

/// Capability seam over one team's chat workspace.
///
/// Implemented by [`SlackClient`]; tests substitute fakes.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str, thread_ts: Option<&str>)
        -> Result<()>;
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>>;
    async fn create_channel(&self, name: &str) -> Result<ChannelInfo>;
    async fn invite(&self, channel_id: &str, user_id: &str) -> Result<()>;
    async fn list_members(&self) -> Result<Vec<Member>>;
    /// Open (or reuse) a DM with a user, returning its channel id
    async fn open_dm(&self, user_id: &str) -> Result<String>;
    /// Publish a user's App Home tab view
    async fn publish_home(&self, user_id: &str, view: Value) -> Result<()>;
}

/// Yields the [`ChatClient`] for a team.
///
/// Implemented by [`ClientRegistry`]; tests substitute fakes, which keeps
/// the event orchestration testable without a live workspace.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Cached client for a team, built on first use
    async fn client(&self, team_id: &str) -> Result<Arc<dyn ChatClient>>;
    /// Drop any cached client, e.g. after a reinstall rotated the token
    fn invalidate(&self, team_id: &str);
}

/// [`Notifier`] that resolves a team's client and role channel, then posts.
pub struct SlackNotifier {
    registry: Arc<dyn ClientProvider>,
    channels: Arc<ChannelDirectory>,
}

impl SlackNotifier {
    pub fn new(registry: Arc<dyn ClientProvider>, channels: Arc<ChannelDirectory>) -> Self {
        SlackNotifier { registry, channels }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post_message(
        &self,
        team_id: &str,
        role: ChannelRole,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<()> {
        let client = self.registry.client(team_id).await?;
        let channel = self
            .channels
            .resolve(team_id, role, client.as_ref())
            .await?;
        for chunk in split_for_post(text) {
            client.post_message(&channel, &chunk, thread_ts).await?;
        }
        Ok(())
    }
}
