//! # Daily Dispatch Feature
//!
//! Once a day (or on demand via the `test` keyword) every reminder whose
//! date matches "today" in the configured timezone is broadcast to its
//! team's reminder channel.
//!
//! Records are never deleted after sending; a reminder recurs on the same
//! month/day every year until its entry is overwritten.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.6.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.1.0: Date matching is numeric, so `05/03` fires on 5/3
//! - 1.0.0: Initial release

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{FixedOffset, Utc};
use log::{error, info};

use crate::core::ReminderRecord;
use crate::database::ReminderStore;
use crate::features::channels::{ChannelRole, Notifier};

pub struct DailyDispatcher {
    store: Arc<dyn ReminderStore>,
    notifier: Arc<dyn Notifier>,
    timezone: FixedOffset,
}

impl DailyDispatcher {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        notifier: Arc<dyn Notifier>,
        timezone: FixedOffset,
    ) -> Self {
        DailyDispatcher {
            store,
            notifier,
            timezone,
        }
    }

    /// Run the sweep for "today" in the target timezone.
    pub async fn run(&self) -> Result<usize> {
        let today = Utc::now()
            .with_timezone(&self.timezone)
            .format("%m/%d")
            .to_string();
        self.run_for_date(&today).await
    }

    /// Run the sweep for an explicit `MM/DD` date.
    ///
    /// One post per record, grouped by team in deterministic order. A
    /// failed post is logged and skipped; persistence stays untouched
    /// either way. Returns the number of reminders delivered.
    pub async fn run_for_date(&self, date: &str) -> Result<usize> {
        let due = self.store.scan_by_date(date).await?;
        if due.is_empty() {
            info!("No reminders due on {date}");
            return Ok(0);
        }

        let mut by_team: BTreeMap<String, Vec<ReminderRecord>> = BTreeMap::new();
        for record in due {
            by_team.entry(record.team_id.clone()).or_default().push(record);
        }

        let mut sent = 0;
        for (team_id, records) in by_team {
            info!("Dispatching {} reminder(s) for team {team_id}", records.len());
            for record in records {
                let text = render_reminder(&record);
                match self
                    .notifier
                    .post_message(&team_id, ChannelRole::Reminder, &text, None)
                    .await
                {
                    Ok(()) => sent += 1,
                    Err(e) => error!(
                        "Failed to deliver reminder for team {team_id} date {}: {e:#}",
                        record.date
                    ),
                }
            }
        }
        Ok(sent)
    }
}

/// Mentions joined by single spaces, then the fixed label and message.
fn render_reminder(record: &ReminderRecord) -> String {
    if record.users.is_empty() {
        format!("Reminder: {}", record.message)
    } else {
        format!("{} Reminder: {}", record.users.join(" "), record.message)
    }
}
