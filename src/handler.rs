//! Inbound event orchestration
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.7.0
//!
//! ## Changelog
//! - 1.3.0: App Home tab with a check-schedule button; clients come through
//!   the `ClientProvider` seam; dedup keys are scoped per team
//! - 1.2.0: `test`/`list` keywords match whole words only
//! - 1.1.0: Storage failures now produce a user-facing failure reply
//! - 1.0.0: Initial release
//!
//! Routes decoded Slack events into the schedule pipeline. The flow for a
//! mention is: dedup check, keyword shortcuts, schedule-channel gate, then
//! parse and reconcile with threaded confirmations back to the author.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::core::{split_for_post, Config, ReminderRecord};
use crate::database::{Database, ReminderStore};
use crate::features::channels::{ChannelDirectory, ChannelRole, Notifier};
use crate::features::dedup::EventDeduper;
use crate::features::dispatch::DailyDispatcher;
use crate::features::schedule::{format_changes, Reconciler, ReminderParser};
use crate::slack::events::{AppMentionEvent, EventEnvelope, EventPayload, InteractionPayload};
use crate::slack::{oauth, ChatClient, ClientProvider};

const GREETING: &str = "Hi, I'm the reminder bot! Post dated schedule lines \
    (like `5/3 Standup @alice`) in #schedule and I'll remind everyone in \
    #reminder on the day.";

/// `action_id` of the App Home button that DMs the current schedule
const CHECK_SCHEDULE_ACTION: &str = "check_schedule";

pub struct EventHandler {
    config: Config,
    db: Arc<Database>,
    store: Arc<dyn ReminderStore>,
    registry: Arc<dyn ClientProvider>,
    channels: Arc<ChannelDirectory>,
    notifier: Arc<dyn Notifier>,
    parser: ReminderParser,
    reconciler: Reconciler,
    dispatcher: DailyDispatcher,
    deduper: EventDeduper,
    http: reqwest::Client,
}

impl EventHandler {
    pub fn new(
        config: Config,
        db: Arc<Database>,
        registry: Arc<dyn ClientProvider>,
        channels: Arc<ChannelDirectory>,
        notifier: Arc<dyn Notifier>,
        http: reqwest::Client,
    ) -> Result<Self> {
        let store: Arc<dyn ReminderStore> = db.clone();
        let timezone = config.timezone()?;
        Ok(EventHandler {
            parser: ReminderParser::new()?,
            reconciler: Reconciler::new(store.clone()),
            dispatcher: DailyDispatcher::new(store.clone(), notifier.clone(), timezone),
            deduper: EventDeduper::default(),
            config,
            db,
            store,
            registry,
            channels,
            notifier,
            http,
        })
    }

    /// Entry point for a decoded event envelope. Never fails; errors are
    /// logged here because the caller has already acked the delivery.
    pub async fn handle_event(&self, envelope: EventEnvelope) {
        let Some(team_id) = envelope.team_id else {
            warn!("Event envelope without team_id, ignoring");
            return;
        };
        let outcome = match envelope.event {
            EventPayload::AppMention(mention) => self.handle_app_mention(&team_id, mention).await,
            EventPayload::TeamJoin(join) => self.handle_team_join(&team_id, &join.user.id).await,
            EventPayload::AppInstalled => self.handle_app_installed(&team_id).await,
            EventPayload::AppHomeOpened(opened) => {
                self.handle_app_home_opened(&team_id, &opened.user).await
            }
            EventPayload::Other => {
                debug!("Unhandled event type for team {team_id}");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            error!("Event handling failed for team {team_id}: {e:#}");
        }
    }

    pub async fn handle_app_mention(&self, team_id: &str, mention: AppMentionEvent) -> Result<()> {
        let message_ts = mention.effective_ts().to_string();
        if self.deduper.check_and_mark(team_id, &message_ts) {
            debug!("Skipping duplicate delivery of {message_ts} for team {team_id}");
            return Ok(());
        }

        if has_keyword(&mention.text, "test") {
            let sent = self.dispatcher.run().await?;
            self.reply(
                team_id,
                &mention.channel,
                &format!("Sent {sent} reminder(s) as a test."),
                Some(&message_ts),
            )
            .await;
            return Ok(());
        }

        if has_keyword(&mention.text, "list") {
            return self.send_listing(team_id, mention.user.as_deref()).await;
        }

        let client = self.registry.client(team_id).await?;
        let schedule_channel = self
            .channels
            .resolve(team_id, ChannelRole::Schedule, client.as_ref())
            .await?;
        if mention.channel != schedule_channel {
            info!("Mention outside the schedule channel, reminders not updated ({message_ts})");
            return Ok(());
        }

        let entries = self.parser.parse(&mention.text);
        if entries.is_empty() {
            self.reply(
                team_id,
                &mention.channel,
                "I couldn't find any `MM/DD` lines in that message, so nothing was saved.",
                Some(&message_ts),
            )
            .await;
            return Ok(());
        }

        match self.reconciler.reconcile(team_id, &entries, &message_ts).await {
            Ok(changes) => {
                if changes.is_empty() {
                    info!("No reminder changes from {message_ts}");
                } else {
                    let summary = format!("Reminders updated.\n{}", format_changes(&changes));
                    // Best effort: the records are already saved
                    if let Err(e) = self
                        .notifier
                        .post_message(team_id, ChannelRole::Schedule, &summary, Some(&message_ts))
                        .await
                    {
                        error!("Failed to post change summary for {message_ts}: {e:#}");
                    }
                }

                let (confirmation, thread_ts) = if mention.edited.is_some() {
                    ("Your edit has been applied to the reminders.", mention.ts.as_str())
                } else {
                    ("Reminder setup complete.", message_ts.as_str())
                };
                self.reply(team_id, &mention.channel, confirmation, Some(thread_ts))
                    .await;
                Ok(())
            }
            Err(e) => {
                // Entries written before the failure stay committed; tell
                // the author so they can repost.
                self.reply(
                    team_id,
                    &mention.channel,
                    "Saving reminders failed partway through; please repost the message.",
                    Some(&message_ts),
                )
                .await;
                Err(e)
            }
        }
    }

    /// DM the requesting user the full stored schedule for their team.
    async fn send_listing(&self, team_id: &str, user: Option<&str>) -> Result<()> {
        let Some(user_id) = user else {
            warn!("Listing requested without a user id");
            return Ok(());
        };
        let records: Vec<ReminderRecord> = self
            .store
            .scan_all()
            .await?
            .into_iter()
            .filter(|record| record.team_id == team_id)
            .collect();
        let text = format_listing(&records);

        let client = self.registry.client(team_id).await?;
        let dm = client.open_dm(user_id).await?;
        for chunk in split_for_post(&text) {
            client.post_message(&dm, &chunk, None).await?;
        }
        Ok(())
    }

    /// Refresh the App Home tab for the viewing user.
    pub async fn handle_app_home_opened(&self, team_id: &str, user_id: &str) -> Result<()> {
        let client = self.registry.client(team_id).await?;
        client.publish_home(user_id, home_view()).await
    }

    /// Interactive-component path. The only wired action is the App Home
    /// button, which DMs the pressing user their team's schedule.
    pub async fn handle_interaction(&self, payload: InteractionPayload) -> Result<()> {
        if payload
            .actions
            .iter()
            .any(|action| action.action_id == CHECK_SCHEDULE_ACTION)
        {
            return self
                .send_listing(&payload.team.id, Some(&payload.user.id))
                .await;
        }
        debug!("Unhandled interaction from team {}", payload.team.id);
        Ok(())
    }

    /// Greet a new member and pull them into both channels.
    pub async fn handle_team_join(&self, team_id: &str, user_id: &str) -> Result<()> {
        info!("New member {user_id} joined team {team_id}");
        let client = self.registry.client(team_id).await?;

        match client.open_dm(user_id).await {
            Ok(dm) => {
                if let Err(e) = client.post_message(&dm, GREETING, None).await {
                    warn!("Could not greet {user_id}: {e:#}");
                }
            }
            Err(e) => warn!("Could not open DM with {user_id}: {e:#}"),
        }

        for role in [ChannelRole::Schedule, ChannelRole::Reminder] {
            match self.channels.resolve(team_id, role, client.as_ref()).await {
                Ok(channel) => {
                    if let Err(e) = client.invite(&channel, user_id).await {
                        warn!(
                            "Could not invite {user_id} to #{}: {e:#}",
                            role.channel_name()
                        );
                    }
                }
                Err(e) => warn!("Could not resolve #{}: {e:#}", role.channel_name()),
            }
        }
        Ok(())
    }

    /// Bootstrap both channels for a fresh install and greet the workspace.
    pub async fn handle_app_installed(&self, team_id: &str) -> Result<()> {
        info!("App installed for team {team_id}");
        let client = self.registry.client(team_id).await?;

        // Resolving creates the channels and invites everyone on first use
        for role in [ChannelRole::Schedule, ChannelRole::Reminder] {
            self.channels
                .resolve(team_id, role, client.as_ref())
                .await?;
        }

        for member in client.list_members().await? {
            if member.is_bot || member.is_app_user {
                continue;
            }
            match client.open_dm(&member.id).await {
                Ok(dm) => {
                    if let Err(e) = client.post_message(&dm, GREETING, None).await {
                        warn!("Could not greet {}: {e:#}", member.id);
                    }
                }
                Err(e) => warn!("Could not open DM with {}: {e:#}", member.id),
            }
        }
        Ok(())
    }

    /// Threaded reply in the channel a mention came from. Replies are best
    /// effort; a failure is logged and never unwinds the pipeline.
    async fn reply(&self, team_id: &str, channel: &str, text: &str, thread_ts: Option<&str>) {
        match self.registry.client(team_id).await {
            Ok(client) => {
                if let Err(e) = client.post_message(channel, text, thread_ts).await {
                    error!("Failed to reply in {channel}: {e:#}");
                }
            }
            Err(e) => error!("No client for team {team_id}: {e:#}"),
        }
    }

    /// Scheduled-trigger path: broadcast everything due today.
    pub async fn run_daily_dispatch(&self) -> Result<usize> {
        self.dispatcher.run().await
    }

    /// OAuth redirect path: exchange the code and persist the team token.
    pub async fn handle_oauth_code(&self, code: &str) -> Result<String> {
        let (team_id, token) = oauth::exchange_code(&self.http, &self.config, code).await?;
        self.db.save_access_token(&team_id, &token).await?;
        // A reinstall rotates the token; drop any stale cached client
        self.registry.invalidate(&team_id);
        Ok(team_id)
    }
}

/// Whole-word keyword check, case-insensitive. `latest` must not trigger
/// the `test` shortcut.
fn has_keyword(text: &str, keyword: &str) -> bool {
    text.split_whitespace()
        .any(|word| word.eq_ignore_ascii_case(keyword))
}

/// App Home tab content: the greeting plus a button that DMs the schedule.
fn home_view() -> serde_json::Value {
    serde_json::json!({
        "type": "home",
        "blocks": [
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": GREETING }
            },
            {
                "type": "actions",
                "elements": [{
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Check schedule" },
                    "action_id": CHECK_SCHEDULE_ACTION
                }]
            }
        ]
    })
}

fn format_listing(records: &[ReminderRecord]) -> String {
    if records.is_empty() {
        return "No reminders are currently set.".to_string();
    }
    let mut text = String::from("Current schedule:\n");
    for record in records {
        text.push_str(&format!(
            "• {}: {} (users: {})\n",
            record.date,
            record.message,
            record.users.join(", ")
        ));
    }
    text
}
