use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use toml;

pub const ANILIST_ACCESS_TOKEN_ENV: &str = "ANILIST_ACCESS_TOKEN";
pub const KITSU_PASSWORD_ENV: &str = "KITSU_PASSWORD";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    // AniList uses a long-lived personal access token
    pub fn get_anilist_access_token(&self) -> Option<&String> {
        self.get("anilist_access_token")
    }

    pub fn set_anilist_access_token(&mut self, token: String) {
        self.set("anilist_access_token".to_string(), token);
    }

    /// Stored token, overridden by `ANILIST_ACCESS_TOKEN` when set
    pub fn resolve_anilist_access_token(&self) -> Option<String> {
        env_override(ANILIST_ACCESS_TOKEN_ENV).or_else(|| self.get_anilist_access_token().cloned())
    }

    // Kitsu uses the OAuth password grant, so the password is kept and the token cached
    pub fn get_kitsu_password(&self) -> Option<&String> {
        self.get("kitsu_password")
    }

    pub fn set_kitsu_password(&mut self, password: String) {
        self.set("kitsu_password".to_string(), password);
    }

    /// Stored password, overridden by `KITSU_PASSWORD` when set
    pub fn resolve_kitsu_password(&self) -> Option<String> {
        env_override(KITSU_PASSWORD_ENV).or_else(|| self.get_kitsu_password().cloned())
    }

    pub fn get_kitsu_access_token(&self) -> Option<&String> {
        self.get("kitsu_access_token")
    }

    pub fn set_kitsu_access_token(&mut self, token: String) {
        self.set("kitsu_access_token".to_string(), token);
    }

    pub fn get_kitsu_token_expires(&self) -> Option<DateTime<Utc>> {
        self.get("kitsu_token_expires")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_kitsu_token_expires(&mut self, expires: DateTime<Utc>) {
        self.set("kitsu_token_expires".to_string(), expires.to_rfc3339());
    }

    /// Cached Kitsu token if it is still valid for at least five more minutes
    pub fn valid_kitsu_access_token(&self) -> Option<&String> {
        let token = self.get_kitsu_access_token().filter(|t| !t.is_empty())?;
        match self.get_kitsu_token_expires() {
            Some(expires_at) if expires_at > Utc::now() + chrono::Duration::minutes(5) => Some(token),
            _ => None,
        }
    }

    pub fn clear_kitsu_token(&mut self) {
        self.remove("kitsu_access_token");
        self.remove("kitsu_token_expires");
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
