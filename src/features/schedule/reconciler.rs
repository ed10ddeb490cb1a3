//! Reminder reconciliation: read, compare, write
//!
//! Each parsed entry is checked against the stored record for the same
//! `(team_id, date)` key, classified as created / updated / unchanged, and
//! then upserted. Unchanged entries are rewritten too so `message_ts` always
//! points at the latest source message, but they produce no change event.
//!
//! Failure policy: entries commit independently and the first storage error
//! aborts the remainder. Nothing is rolled back; the caller reports the
//! failure so the author knows the message did not fully take effect.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info};

use crate::core::ReminderRecord;
use crate::database::ReminderStore;
use crate::features::schedule::ParsedEntry;

/// One non-trivial outcome of reconciling a parsed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created {
        new: ReminderRecord,
    },
    Updated {
        old: ReminderRecord,
        new: ReminderRecord,
    },
}

pub struct Reconciler {
    store: Arc<dyn ReminderStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        Reconciler { store }
    }

    /// Persist every entry in parser order and collect the change events.
    ///
    /// A date appearing twice in one message produces two entries; the
    /// second one sees the first as "existing" and overwrites it, so the
    /// later entry wins.
    pub async fn reconcile(
        &self,
        team_id: &str,
        entries: &[ParsedEntry],
        source_ts: &str,
    ) -> Result<Vec<ChangeEvent>> {
        let mut changes = Vec::new();
        for entry in entries {
            let candidate = ReminderRecord {
                team_id: team_id.to_string(),
                date: entry.date.clone(),
                users: entry.users.clone(),
                message: entry.message.clone(),
                message_ts: source_ts.to_string(),
            };

            match self.store.get(team_id, &candidate.date).await? {
                None => changes.push(ChangeEvent::Created {
                    new: candidate.clone(),
                }),
                Some(existing) if !existing.content_eq(&candidate) => {
                    changes.push(ChangeEvent::Updated {
                        old: existing,
                        new: candidate.clone(),
                    })
                }
                Some(_) => debug!(
                    "Reminder for {team_id} {} unchanged, refreshing message_ts",
                    candidate.date
                ),
            }

            self.store.put(&candidate).await?;
            info!(
                "Saved reminder: team {team_id}, date {}, users [{}], message {:?}",
                candidate.date,
                candidate.users.join(", "),
                candidate.message
            );
        }
        Ok(changes)
    }
}

/// Render the aggregated change summary posted back to the schedule channel.
pub fn format_changes(changes: &[ChangeEvent]) -> String {
    changes
        .iter()
        .map(|change| match change {
            ChangeEvent::Created { new } => format!(
                "Created:\ndate: {}\nusers: {}\nmessage: {}",
                new.date,
                new.users.join(", "),
                new.message
            ),
            ChangeEvent::Updated { old, new } => format!(
                "Updated:\ndate: {}\nusers: {} → {}\nmessage: {} → {}",
                new.date,
                old.users.join(", "),
                new.users.join(", "),
                old.message,
                new.message
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
