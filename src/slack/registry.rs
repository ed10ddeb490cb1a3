//! Per-team client registry
//!
//! Each installed workspace has its own bot token, so API calls go through
//! a client configured for that team. Clients are built lazily from the
//! stored OAuth token and cached for the life of the process; the registry
//! is owned by the composition root, not a global.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use crate::database::Database;
use crate::slack::{ChatClient, ClientProvider, SlackClient};

pub struct ClientRegistry {
    clients: DashMap<String, Arc<dyn ChatClient>>,
    db: Arc<Database>,
    http: reqwest::Client,
    /// Used when a team has no stored token (single-workspace deploys)
    fallback_token: Option<String>,
}

impl ClientRegistry {
    pub fn new(db: Arc<Database>, http: reqwest::Client, fallback_token: Option<String>) -> Self {
        ClientRegistry {
            clients: DashMap::new(),
            db,
            http,
            fallback_token,
        }
    }

}

#[async_trait]
impl ClientProvider for ClientRegistry {
    async fn client(&self, team_id: &str) -> Result<Arc<dyn ChatClient>> {
        if let Some(client) = self.clients.get(team_id) {
            return Ok(client.clone());
        }

        let token = match self.db.get_access_token(team_id).await? {
            Some(token) => token,
            None => self
                .fallback_token
                .clone()
                .with_context(|| format!("no access token stored for team {team_id}"))?,
        };

        debug!("Building Slack client for team {team_id}");
        let client: Arc<dyn ChatClient> = Arc::new(SlackClient::new(self.http.clone(), token));
        self.clients.insert(team_id.to_string(), client.clone());
        Ok(client)
    }

    fn invalidate(&self, team_id: &str) {
        self.clients.remove(team_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registry(fallback: Option<&str>) -> ClientRegistry {
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        ClientRegistry::new(db, reqwest::Client::new(), fallback.map(str::to_string))
    }

    #[tokio::test]
    async fn test_unknown_team_without_fallback_errors() {
        let registry = registry(None).await;
        let err = registry.client("T1").await.err().unwrap();
        assert!(err.to_string().contains("T1"));
    }

    #[tokio::test]
    async fn test_fallback_token_builds_client() {
        let registry = registry(Some("xoxb-fallback")).await;
        assert!(registry.client("T1").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_then_rebuild() {
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        db.save_access_token("T1", "xoxb-stored").await.unwrap();
        let registry = ClientRegistry::new(db, reqwest::Client::new(), None);

        assert!(registry.client("T1").await.is_ok());
        registry.invalidate("T1");
        assert!(registry.client("T1").await.is_ok());
    }
}
