//! Builds authenticated service clients from configuration and stored credentials

use crate::anilist::{api as anilist_api, AniListClient};
use crate::error::SourceError;
use crate::kitsu::{auth as kitsu_auth, KitsuClient, TokenInfo};
use library_audit_config::{validate_anilist_token, Config, CredentialStore};
use std::time::Duration;
use tracing::{info, warn};

/// Where each service lives; overridden in tests
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub anilist_api_url: String,
    pub kitsu_api_root: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            anilist_api_url: anilist_api::API_URL.to_string(),
            kitsu_api_root: kitsu_auth::API_ROOT.to_string(),
        }
    }
}

/// Both clients, authenticated, with the user ids an audit needs
pub struct ConnectedServices {
    pub anilist: AniListClient,
    pub anilist_user_id: String,
    pub kitsu: KitsuClient,
    pub kitsu_user_id: String,
    /// Set when a new Kitsu token was issued; the caller should persist it
    pub refreshed_kitsu_token: Option<TokenInfo>,
}

/// Validate credentials and resolve user ids on both services
pub async fn connect_services(
    config: &Config,
    credentials: &CredentialStore,
    endpoints: &ServiceEndpoints,
) -> Result<ConnectedServices, SourceError> {
    let options = &config.audit;
    let page_delay = Duration::from_millis(options.page_delay_ms);

    let anilist_username = config
        .anilist_username()
        .ok_or_else(|| SourceError::Auth("AniList username is not configured".to_string()))?;
    let anilist_token = credentials
        .resolve_anilist_access_token()
        .ok_or_else(|| SourceError::Auth("AniList access token is not configured".to_string()))?;
    validate_anilist_token(&anilist_token).map_err(|e| SourceError::Auth(e.to_string()))?;

    let anilist = AniListClient::new(anilist_token)
        .with_api_url(endpoints.anilist_api_url.clone())
        .with_exclude_novels(options.exclude_novels)
        .with_page_delay(page_delay);
    let anilist_user_id = anilist.resolve_user_id(anilist_username).await?;

    let (kitsu, kitsu_user_id, refreshed_kitsu_token) = connect_kitsu(config, credentials, endpoints).await?;
    let kitsu = kitsu
        .with_exclude_novels(options.exclude_novels)
        .with_page_delay(page_delay);

    Ok(ConnectedServices {
        anilist,
        anilist_user_id,
        kitsu,
        kitsu_user_id,
        refreshed_kitsu_token,
    })
}

async fn connect_kitsu(
    config: &Config,
    credentials: &CredentialStore,
    endpoints: &ServiceEndpoints,
) -> Result<(KitsuClient, String, Option<TokenInfo>), SourceError> {
    if let Some(token) = credentials.valid_kitsu_access_token() {
        let client = KitsuClient::new(token.clone()).with_api_root(endpoints.kitsu_api_root.clone());
        match client.resolve_user_id().await {
            Ok(user_id) => {
                info!("Using saved Kitsu access token");
                return Ok((client, user_id, None));
            }
            Err(e) if e.is_auth() => warn!("Saved Kitsu token was rejected, logging in again"),
            Err(e) => return Err(e),
        }
    }

    let username = config
        .kitsu_username()
        .ok_or_else(|| SourceError::Auth("Kitsu username is not configured".to_string()))?;
    let password = credentials
        .resolve_kitsu_password()
        .ok_or_else(|| SourceError::Auth("Kitsu password is not configured".to_string()))?;

    let (client, token) = KitsuClient::login(&endpoints.kitsu_api_root, username, &password).await?;
    let user_id = client.resolve_user_id().await?;
    Ok((client, user_id, Some(token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_audit_config::{AniListConfig, KitsuConfig};
    use mockito::Matcher;

    fn config() -> Config {
        Config {
            anilist: Some(AniListConfig { username: "reader".to_string() }),
            kitsu: Some(KitsuConfig { username: "reader@example.com".to_string() }),
            ..Default::default()
        }
    }

    fn credentials(dir: &tempfile::TempDir) -> CredentialStore {
        let mut store = CredentialStore::new(dir.path().join("credentials.toml"));
        store.set_anilist_access_token("a".repeat(60));
        store.set_kitsu_password("hunter2".to_string());
        store
    }

    #[tokio::test]
    async fn test_connect_with_password_grant() {
        let mut anilist = mockito::Server::new_async().await;
        let mut kitsu = mockito::Server::new_async().await;
        anilist
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"User":{"id":31,"name":"reader"}}}"#)
            .create_async()
            .await;
        kitsu
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"fresh","expires_in":3600}"#)
            .create_async()
            .await;
        kitsu
            .mock("GET", "/edge/users")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"44","type":"users"}]}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let endpoints = ServiceEndpoints {
            anilist_api_url: anilist.url(),
            kitsu_api_root: kitsu.url(),
        };
        let services = connect_services(&config(), &credentials(&dir), &endpoints).await.unwrap();

        assert_eq!(services.anilist_user_id, "31");
        assert_eq!(services.kitsu_user_id, "44");
        assert_eq!(services.refreshed_kitsu_token.unwrap().access_token, "fresh");
    }

    #[tokio::test]
    async fn test_short_anilist_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = credentials(&dir);
        store.set_anilist_access_token("short".to_string());

        let endpoints = ServiceEndpoints {
            anilist_api_url: "http://127.0.0.1:9".to_string(),
            kitsu_api_root: "http://127.0.0.1:9".to_string(),
        };
        let err = connect_services(&config(), &store, &endpoints).await.err().unwrap();
        assert!(err.is_auth());
    }
}
