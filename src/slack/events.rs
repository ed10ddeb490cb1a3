//! Inbound event payloads
//!
//! The Events API posts a JSON envelope per delivery. Only the handful of
//! event types the bot reacts to are modeled; everything else decodes as
//! `Other` and is ignored.

use serde::Deserialize;

/// Top-level body posted to the events URL
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundPayload {
    /// Endpoint ownership handshake; echo the challenge back
    UrlVerification { challenge: String },
    /// A subscribed event wrapped in its delivery envelope
    EventCallback(EventEnvelope),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    pub team_id: Option<String>,
    pub event: EventPayload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    AppMention(AppMentionEvent),
    TeamJoin(TeamJoinEvent),
    AppInstalled,
    AppHomeOpened(AppHomeOpenedEvent),
    #[serde(other)]
    Other,
}

/// The bot was @-mentioned (covers both new messages and edits)
#[derive(Debug, Deserialize)]
pub struct AppMentionEvent {
    pub channel: String,
    pub user: Option<String>,
    pub text: String,
    pub ts: String,
    pub edited: Option<EditInfo>,
}

#[derive(Debug, Deserialize)]
pub struct EditInfo {
    pub ts: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamJoinEvent {
    pub user: JoinedUser,
}

#[derive(Debug, Deserialize)]
pub struct JoinedUser {
    pub id: String,
}

/// A user opened the bot's App Home tab
#[derive(Debug, Deserialize)]
pub struct AppHomeOpenedEvent {
    pub user: String,
}

/// Decoded body of the form-encoded `payload` field that interactive
/// components (the App Home button) post to the interactions URL.
#[derive(Debug, Deserialize)]
pub struct InteractionPayload {
    pub team: IdRef,
    pub user: IdRef,
    #[serde(default)]
    pub actions: Vec<InteractionAction>,
}

#[derive(Debug, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionAction {
    pub action_id: String,
}

impl AppMentionEvent {
    /// The timestamp identifying this version of the message: the edit
    /// timestamp when present, the original otherwise. Used both as the
    /// idempotency key and as the stored `message_ts`.
    pub fn effective_ts(&self) -> &str {
        self.edited.as_ref().map_or(&self.ts, |edit| &edit.ts)
    }
}
