use crate::error::SourceError;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration as StdDuration;

/// Root of the Kitsu API; OAuth lives under `/oauth`, resources under `/edge`
pub const API_ROOT: &str = "https://kitsu.io/api";

/// Create a reqwest Client identifying the tool
pub fn create_kitsu_client() -> Client {
    Client::builder()
        .user_agent(concat!("dualshelf/", env!("CARGO_PKG_VERSION")))
        .timeout(StdDuration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    30 * 24 * 3600 // Kitsu tokens last 30 days
}

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchange a username and password for an access token
pub async fn password_grant(
    client: &Client,
    api_root: &str,
    username: &str,
    password: &str,
) -> Result<TokenInfo, SourceError> {
    let url = format!("{}/oauth/token", api_root);
    let response = client
        .post(&url)
        .header("Accept", "application/json")
        .json(&json!({
            "grant_type": "password",
            "username": username,
            "password": password,
        }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        // invalid_grant comes back as 400
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(SourceError::Auth(format!("Kitsu token request rejected: {}", error_text)));
        }
        return Err(SourceError::from_status(status, "Kitsu token request", &error_text));
    }

    let token: TokenResponse = response.json().await?;
    Ok(TokenInfo {
        access_token: token.access_token,
        expires_at: Utc::now() + Duration::seconds(token.expires_in),
    })
}
