//! Thin Slack Web API client
//!
//! Wraps the handful of methods the bot needs. Slack reports failures as
//! `{"ok": false, "error": "..."}` with HTTP 200, so every response goes
//! through an `ok` check before any field is read.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};

use super::{ChannelInfo, ChatClient, Member};

const API_BASE: &str = "https://slack.com/api";

pub struct SlackClient {
    http: reqwest::Client,
    token: String,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        SlackClient { http, token }
    }

    /// POST a JSON-body Web API method.
    async fn post(&self, method: &str, payload: Value) -> Result<Value> {
        debug!("Slack API call: {method}");
        let response = self
            .http
            .post(format!("{API_BASE}/{method}"))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?
            .json::<Value>()
            .await
            .with_context(|| format!("{method} returned non-JSON"))?;
        check_ok(method, response)
    }

    /// GET a query-parameter Web API method (the list endpoints do not
    /// accept JSON bodies).
    async fn get(&self, method: &str, query: &[(&str, &str)]) -> Result<Value> {
        debug!("Slack API call: {method}");
        let response = self
            .http
            .get(format!("{API_BASE}/{method}"))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?
            .json::<Value>()
            .await
            .with_context(|| format!("{method} returned non-JSON"))?;
        check_ok(method, response)
    }
}

fn check_ok(method: &str, response: Value) -> Result<Value> {
    if response["ok"].as_bool() == Some(true) {
        Ok(response)
    } else {
        let code = response["error"].as_str().unwrap_or("unknown_error");
        Err(anyhow!("{method} failed: {code}"))
    }
}

fn field<T: serde::de::DeserializeOwned>(response: &Value, pointer: &str) -> Result<T> {
    let value = response
        .pointer(pointer)
        .with_context(|| format!("response missing {pointer}"))?;
    serde_json::from_value(value.clone()).with_context(|| format!("malformed {pointer}"))
}

#[async_trait]
impl ChatClient for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<()> {
        let mut payload = json!({ "channel": channel, "text": text });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = json!(ts);
        }
        self.post("chat.postMessage", payload).await?;
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>> {
        let response = self
            .get("conversations.list", &[("limit", "1000"), ("exclude_archived", "true")])
            .await?;
        field(&response, "/channels")
    }

    async fn create_channel(&self, name: &str) -> Result<ChannelInfo> {
        let response = self
            .post("conversations.create", json!({ "name": name }))
            .await?;
        field(&response, "/channel")
    }

    async fn invite(&self, channel_id: &str, user_id: &str) -> Result<()> {
        self.post(
            "conversations.invite",
            json!({ "channel": channel_id, "users": user_id }),
        )
        .await?;
        Ok(())
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        let response = self.get("users.list", &[("limit", "1000")]).await?;
        field(&response, "/members")
    }

    async fn open_dm(&self, user_id: &str) -> Result<String> {
        let response = self
            .post("conversations.open", json!({ "users": user_id }))
            .await?;
        field(&response, "/channel/id")
    }

    async fn publish_home(&self, user_id: &str, view: Value) -> Result<()> {
        self.post("views.publish", json!({ "user_id": user_id, "view": view }))
            .await?;
        Ok(())
    }
}
