//! SQLite persistence for reminders and OAuth tokens
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Day-of scans match dates numerically so `05/03` and `5/3` hit
//!   the same calendar day
//! - 1.0.0: Initial release with reminders and access_tokens tables
//!
//! The reminders table is keyed `(team_id, date)`; writes are upserts, so
//! the most recent version of a day's reminder always wins. `users` is
//! stored as a JSON array to keep the mention order intact.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use sqlite::{Connection, ConnectionThreadSafe, State};

use crate::core::{date_key, ReminderRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    team_id    TEXT NOT NULL,
    date       TEXT NOT NULL,
    users      TEXT NOT NULL,
    message    TEXT NOT NULL,
    message_ts TEXT NOT NULL,
    PRIMARY KEY (team_id, date)
);
CREATE TABLE IF NOT EXISTS access_tokens (
    team_id      TEXT PRIMARY KEY,
    access_token TEXT NOT NULL
);
";

/// Keyed reminder storage as seen by the reconciler and the dispatcher.
///
/// `get` is an exact-key lookup (dates are stored as typed); `scan_by_date`
/// matches numerically so padding differences do not hide a reminder on its
/// day.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Upsert; replaces any prior record at `(team_id, date)` entirely
    async fn put(&self, record: &ReminderRecord) -> Result<()>;
    /// Point lookup by exact `(team_id, date)` key
    async fn get(&self, team_id: &str, date: &str) -> Result<Option<ReminderRecord>>;
    /// All records whose date names the same calendar day as `date`
    async fn scan_by_date(&self, date: &str) -> Result<Vec<ReminderRecord>>;
    /// Every stored record, ordered by date then team
    async fn scan_all(&self) -> Result<Vec<ReminderRecord>>;
}

/// SQLite-backed [`ReminderStore`] plus OAuth token persistence
pub struct Database {
    conn: ConnectionThreadSafe,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open_thread_safe(path)
            .with_context(|| format!("failed to open database at {path}"))?;
        conn.execute(SCHEMA).context("failed to apply schema")?;
        info!("Database ready at {path}");
        Ok(Database { conn })
    }

    pub async fn save_access_token(&self, team_id: &str, access_token: &str) -> Result<()> {
        let mut statement = self.conn.prepare(
            "INSERT INTO access_tokens (team_id, access_token) VALUES (?, ?)
             ON CONFLICT(team_id) DO UPDATE SET access_token = excluded.access_token",
        )?;
        statement.bind((1, team_id))?;
        statement.bind((2, access_token))?;
        while statement.next()? != State::Done {}
        Ok(())
    }

    pub async fn get_access_token(&self, team_id: &str) -> Result<Option<String>> {
        let mut statement = self
            .conn
            .prepare("SELECT access_token FROM access_tokens WHERE team_id = ?")?;
        statement.bind((1, team_id))?;
        if statement.next()? == State::Row {
            Ok(Some(statement.read::<String, _>(0)?))
        } else {
            Ok(None)
        }
    }

    fn read_record(statement: &sqlite::Statement<'_>) -> Result<ReminderRecord> {
        let users_json = statement.read::<String, _>(2)?;
        Ok(ReminderRecord {
            team_id: statement.read::<String, _>(0)?,
            date: statement.read::<String, _>(1)?,
            users: serde_json::from_str(&users_json).context("corrupt users column")?,
            message: statement.read::<String, _>(3)?,
            message_ts: statement.read::<String, _>(4)?,
        })
    }
}

#[async_trait]
impl ReminderStore for Database {
    async fn put(&self, record: &ReminderRecord) -> Result<()> {
        let users = serde_json::to_string(&record.users)?;
        let mut statement = self.conn.prepare(
            "INSERT INTO reminders (team_id, date, users, message, message_ts)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(team_id, date) DO UPDATE SET
                 users = excluded.users,
                 message = excluded.message,
                 message_ts = excluded.message_ts",
        )?;
        statement.bind((1, record.team_id.as_str()))?;
        statement.bind((2, record.date.as_str()))?;
        statement.bind((3, users.as_str()))?;
        statement.bind((4, record.message.as_str()))?;
        statement.bind((5, record.message_ts.as_str()))?;
        while statement.next()? != State::Done {}
        Ok(())
    }

    async fn get(&self, team_id: &str, date: &str) -> Result<Option<ReminderRecord>> {
        let mut statement = self.conn.prepare(
            "SELECT team_id, date, users, message, message_ts
             FROM reminders WHERE team_id = ? AND date = ?",
        )?;
        statement.bind((1, team_id))?;
        statement.bind((2, date))?;
        if statement.next()? == State::Row {
            Ok(Some(Self::read_record(&statement)?))
        } else {
            Ok(None)
        }
    }

    async fn scan_by_date(&self, date: &str) -> Result<Vec<ReminderRecord>> {
        // Dates are stored as typed ("5/3" vs "05/03"), so the day-of filter
        // compares numeric keys rather than strings.
        let wanted = date_key(date);
        if wanted.is_none() {
            return Ok(Vec::new());
        }
        let records = self.scan_all().await?;
        Ok(records
            .into_iter()
            .filter(|record| date_key(&record.date) == wanted)
            .collect())
    }

    async fn scan_all(&self) -> Result<Vec<ReminderRecord>> {
        let mut statement = self.conn.prepare(
            "SELECT team_id, date, users, message, message_ts
             FROM reminders ORDER BY date, team_id",
        )?;
        let mut records = Vec::new();
        while statement.next()? == State::Row {
            records.push(Self::read_record(&statement)?);
        }
        Ok(records)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn record(team: &str, date: &str, users: &[&str], message: &str, ts: &str) -> ReminderRecord {
        ReminderRecord {
            team_id: team.to_string(),
            date: date.to_string(),
            users: users.iter().map(|u| u.to_string()).collect(),
            message: message.to_string(),
            message_ts: ts.to_string(),
        }
    }

    async fn database() -> Database {
        Database::new(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let db = database().await;
        let rec = record("T1", "5/3", &["<@a", "<@b (lead)"], "standup", "1.0");
        db.put(&rec).await.unwrap();

        let got = db.get("T1", "5/3").await.unwrap().unwrap();
        assert_eq!(got, rec);
        assert!(db.get("T1", "5/4").await.unwrap().is_none());
        assert!(db.get("T2", "5/3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_record() {
        let db = database().await;
        db.put(&record("T1", "5/3", &["<@a"], "standup", "1.0"))
            .await
            .unwrap();
        db.put(&record("T1", "5/3", &["<@b"], "retro", "2.0"))
            .await
            .unwrap();

        let got = db.get("T1", "5/3").await.unwrap().unwrap();
        assert_eq!(got.users, vec!["<@b"]);
        assert_eq!(got.message, "retro");
        assert_eq!(got.message_ts, "2.0");
        assert_eq!(db.scan_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_by_date_matches_numerically() {
        let db = database().await;
        db.put(&record("T1", "5/3", &[], "a", "1.0")).await.unwrap();
        db.put(&record("T2", "05/03", &[], "b", "1.0")).await.unwrap();
        db.put(&record("T1", "5/4", &[], "c", "1.0")).await.unwrap();

        let hits = db.scan_by_date("05/03").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| date_key(&r.date) == Some((5, 3))));

        assert!(db.scan_by_date("not a date").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_access_token_roundtrip() {
        let db = database().await;
        assert!(db.get_access_token("T1").await.unwrap().is_none());

        db.save_access_token("T1", "xoxb-first").await.unwrap();
        db.save_access_token("T1", "xoxb-second").await.unwrap();
        assert_eq!(
            db.get_access_token("T1").await.unwrap().as_deref(),
            Some("xoxb-second")
        );
    }
}
