//! OAuth v2 code exchange
//!
//! The install redirect hands us a temporary code; `oauth.v2.access` trades
//! it for a bot token scoped to the installing team. Token persistence is
//! the caller's job.

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::Deserialize;

use crate::core::Config;

const ACCESS_URL: &str = "https://slack.com/api/oauth.v2.access";

#[derive(Debug, Deserialize)]
pub struct OAuthAccess {
    pub ok: bool,
    pub access_token: Option<String>,
    pub team: Option<TeamRef>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeamRef {
    pub id: String,
}

/// Exchange an OAuth code for `(team_id, access_token)`.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &Config,
    code: &str,
) -> Result<(String, String)> {
    let response = http
        .post(ACCESS_URL)
        .form(&[
            ("client_id", config.slack_client_id.as_str()),
            ("client_secret", config.slack_client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.slack_redirect_uri.as_str()),
        ])
        .send()
        .await
        .context("oauth.v2.access request failed")?
        .json::<OAuthAccess>()
        .await
        .context("oauth.v2.access returned non-JSON")?;

    let (team_id, access_token) = unpack(response)?;
    info!("Completed OAuth install for team {team_id}");
    Ok((team_id, access_token))
}

fn unpack(response: OAuthAccess) -> Result<(String, String)> {
    if !response.ok {
        return Err(anyhow!(
            "oauth.v2.access failed: {}",
            response.error.as_deref().unwrap_or("unknown_error")
        ));
    }
    let token = response
        .access_token
        .context("oauth.v2.access response missing access_token")?;
    let team = response
        .team
        .context("oauth.v2.access response missing team")?;
    Ok((team.id, token))
}
