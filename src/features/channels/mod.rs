//! # Channel Bootstrap Feature
//!
//! Every team gets two well-known channels: `#schedule`, where authors post
//! and edit the schedule, and `#reminder`, where day-of reminders land.
//! This module resolves a role to a concrete channel id, creating the
//! channel and inviting the workspace members when it does not exist yet.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0
//! - **Toggleable**: false

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::{info, warn};

use crate::slack::ChatClient;

/// The two outbound destinations a team has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Confirmations and change summaries
    Schedule,
    /// Day-of reminder broadcasts
    Reminder,
}

impl ChannelRole {
    /// Channel name this role maps to
    pub fn channel_name(self) -> &'static str {
        match self {
            ChannelRole::Schedule => "schedule",
            ChannelRole::Reminder => "reminder",
        }
    }
}

/// Outbound notification seam used by the reconciliation and dispatch paths.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_message(
        &self,
        team_id: &str,
        role: ChannelRole,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<()>;
}

/// Per-team cache of resolved channel ids, keyed by role.
#[derive(Default)]
pub struct ChannelDirectory {
    ids: DashMap<(String, ChannelRole), String>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the channel for `(team, role)`, creating it on first use.
    ///
    /// A newly created channel gets every non-bot member invited; a failed
    /// invite is logged and skipped so one deactivated account cannot block
    /// the bootstrap.
    pub async fn resolve(
        &self,
        team_id: &str,
        role: ChannelRole,
        client: &dyn ChatClient,
    ) -> Result<String> {
        let key = (team_id.to_string(), role);
        if let Some(id) = self.ids.get(&key) {
            return Ok(id.clone());
        }

        let name = role.channel_name();
        if let Some(existing) = client
            .list_channels()
            .await?
            .into_iter()
            .find(|channel| channel.name == name)
        {
            self.ids.insert(key, existing.id.clone());
            return Ok(existing.id);
        }

        let created = client.create_channel(name).await?;
        info!("Created #{name} channel {} for team {team_id}", created.id);

        for member in client.list_members().await? {
            if member.is_bot || member.is_app_user {
                continue;
            }
            if let Err(e) = client.invite(&created.id, &member.id).await {
                warn!(
                    "Could not invite {} to #{name} for team {team_id}: {e:#}",
                    member.id
                );
            }
        }

        self.ids.insert(key, created.id.clone());
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::{ChannelInfo, Member};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeChat {
        channels: Vec<ChannelInfo>,
        members: Vec<Member>,
        list_calls: AtomicUsize,
        invited: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatClient for FakeChat {
        async fn post_message(&self, _: &str, _: &str, _: Option<&str>) -> Result<()> {
            Ok(())
        }

        async fn list_channels(&self) -> Result<Vec<ChannelInfo>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.channels.clone())
        }

        async fn create_channel(&self, name: &str) -> Result<ChannelInfo> {
            Ok(ChannelInfo {
                id: format!("C_{name}"),
                name: name.to_string(),
            })
        }

        async fn invite(&self, _channel_id: &str, user_id: &str) -> Result<()> {
            if user_id == "U_gone" {
                anyhow::bail!("account_inactive");
            }
            self.invited.lock().unwrap().push(user_id.to_string());
            Ok(())
        }

        async fn list_members(&self) -> Result<Vec<Member>> {
            Ok(self.members.clone())
        }

        async fn open_dm(&self, user_id: &str) -> Result<String> {
            Ok(format!("D_{user_id}"))
        }

        async fn publish_home(&self, _: &str, _: serde_json::Value) -> Result<()> {
            Ok(())
        }
    }

    fn member(id: &str, is_bot: bool) -> Member {
        Member {
            id: id.to_string(),
            is_bot,
            is_app_user: false,
        }
    }

    #[tokio::test]
    async fn test_existing_channel_found_and_cached() {
        let chat = FakeChat {
            channels: vec![ChannelInfo {
                id: "C123".to_string(),
                name: "schedule".to_string(),
            }],
            ..Default::default()
        };
        let directory = ChannelDirectory::new();

        let first = directory
            .resolve("T1", ChannelRole::Schedule, &chat)
            .await
            .unwrap();
        let second = directory
            .resolve("T1", ChannelRole::Schedule, &chat)
            .await
            .unwrap();

        assert_eq!(first, "C123");
        assert_eq!(second, "C123");
        // Second resolve is served from the cache
        assert_eq!(chat.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_channel_created_with_invites() {
        let chat = FakeChat {
            members: vec![
                member("U_alice", false),
                member("U_bot", true),
                member("U_gone", false),
                member("U_bob", false),
            ],
            ..Default::default()
        };
        let directory = ChannelDirectory::new();

        let id = directory
            .resolve("T1", ChannelRole::Reminder, &chat)
            .await
            .unwrap();

        assert_eq!(id, "C_reminder");
        // Bots are skipped and the failed invite does not abort the rest
        assert_eq!(*chat.invited.lock().unwrap(), vec!["U_alice", "U_bob"]);
    }

    #[tokio::test]
    async fn test_roles_resolve_independently() {
        let chat = FakeChat::default();
        let directory = ChannelDirectory::new();

        let schedule = directory
            .resolve("T1", ChannelRole::Schedule, &chat)
            .await
            .unwrap();
        let reminder = directory
            .resolve("T1", ChannelRole::Reminder, &chat)
            .await
            .unwrap();

        assert_eq!(schedule, "C_schedule");
        assert_eq!(reminder, "C_reminder");
    }
}
