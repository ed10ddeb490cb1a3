//! Reminder record domain type
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//!
//! A reminder is keyed by `(team_id, date)`; at most one record exists per
//! key and a later write replaces the earlier one entirely.

use serde::{Deserialize, Serialize};

/// One stored reminder: who to mention and what to say on a given day.
///
/// `date` is kept exactly as the author typed it (`M/D` through `MM/DD`);
/// day-of matching normalizes both sides numerically instead of rewriting
/// the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    /// Workspace the record belongs to; partition key
    pub team_id: String,
    /// Calendar day, `MM/DD` with 1-2 digits per part; no year
    pub date: String,
    /// Mention tokens in order of first appearance, each with a `<` marker
    pub users: Vec<String>,
    /// Free text left after mentions are stripped, edge-trimmed
    pub message: String,
    /// Timestamp of the source message that produced this version
    pub message_ts: String,
}

impl ReminderRecord {
    /// Change-detection equality: every field except `message_ts`.
    ///
    /// `users` is compared as an ordered sequence; the same people in a
    /// different order count as a change.
    pub fn content_eq(&self, other: &ReminderRecord) -> bool {
        self.team_id == other.team_id
            && self.date == other.date
            && self.users == other.users
            && self.message == other.message
    }
}

/// Parse a `MM/DD` token into a numeric (month, day) key.
///
/// Returns `None` for anything that is not two slash-separated 1-2 digit
/// numbers. No range validation beyond the digit count; `13/40` is accepted
/// the same way the parser accepts it.
pub fn date_key(date: &str) -> Option<(u32, u32)> {
    let (month, day) = date.trim().split_once('/')?;
    if month.is_empty() || month.len() > 2 || day.is_empty() || day.len() > 2 {
        return None;
    }
    Some((month.parse().ok()?, day.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(users: &[&str], message: &str, ts: &str) -> ReminderRecord {
        ReminderRecord {
            team_id: "T1".to_string(),
            date: "5/3".to_string(),
            users: users.iter().map(|u| u.to_string()).collect(),
            message: message.to_string(),
            message_ts: ts.to_string(),
        }
    }

    #[test]
    fn test_content_eq_ignores_message_ts() {
        let a = record(&["<@a"], "standup", "111.0");
        let b = record(&["<@a"], "standup", "222.0");
        assert!(a.content_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_eq_is_order_sensitive() {
        let a = record(&["<@a", "<@b"], "standup", "111.0");
        let b = record(&["<@b", "<@a"], "standup", "111.0");
        assert!(!a.content_eq(&b));
    }

    #[test]
    fn test_content_eq_detects_message_change() {
        let a = record(&["<@a"], "standup", "111.0");
        let b = record(&["<@a"], "retro", "111.0");
        assert!(!a.content_eq(&b));
    }

    #[test]
    fn test_date_key_accepts_padded_and_unpadded() {
        assert_eq!(date_key("5/3"), Some((5, 3)));
        assert_eq!(date_key("05/03"), Some((5, 3)));
        assert_eq!(date_key(" 12/31 "), Some((12, 31)));
    }

    #[test]
    fn test_date_key_rejects_garbage() {
        assert_eq!(date_key("5-3"), None);
        assert_eq!(date_key("123/4"), None);
        assert_eq!(date_key("5/"), None);
        assert_eq!(date_key(""), None);
    }
}
