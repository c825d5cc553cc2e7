use library_audit_models::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ANILIST_USERNAME_ENV: &str = "ANILIST_USERNAME";
pub const KITSU_USERNAME_ENV: &str = "KITSU_USERNAME";

/// AniList personal access tokens are JWTs; anything shorter is a paste error
pub const MIN_ANILIST_TOKEN_LEN: usize = 50;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub anilist: Option<AniListConfig>,
    #[serde(default)]
    pub kitsu: Option<KitsuConfig>,
    #[serde(default)]
    pub audit: AuditOptions,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AniListConfig {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KitsuConfig {
    /// Kitsu login (email or username) used for the password grant
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditOptions {
    #[serde(default)]
    pub media_kind: MediaKind,
    /// Pause before each catalog search after the first
    #[serde(default = "default_delay_ms")]
    pub search_delay_ms: u64,
    /// Pause between library pages
    #[serde(default = "default_delay_ms")]
    pub page_delay_ms: u64,
    /// Skip light novels when auditing manga
    #[serde(default = "default_true")]
    pub exclude_novels: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            media_kind: MediaKind::default(),
            search_delay_ms: default_delay_ms(),
            page_delay_ms: default_delay_ms(),
            exclude_novels: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    1000
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `ANILIST_USERNAME` / `KITSU_USERNAME` take precedence over the file
    pub fn apply_env_overrides(&mut self) {
        if let Some(username) = env_value(ANILIST_USERNAME_ENV) {
            self.anilist = Some(AniListConfig { username });
        }
        if let Some(username) = env_value(KITSU_USERNAME_ENV) {
            self.kitsu = Some(KitsuConfig { username });
        }
    }

    pub fn anilist_username(&self) -> Option<&str> {
        self.anilist
            .as_ref()
            .map(|a| a.username.trim())
            .filter(|u| !u.is_empty())
    }

    pub fn kitsu_username(&self) -> Option<&str> {
        self.kitsu
            .as_ref()
            .map(|k| k.username.trim())
            .filter(|u| !u.is_empty())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.anilist_username().is_none() {
            return Err(anyhow::anyhow!(
                "AniList username is not configured (run 'dualshelf config anilist' or set {})",
                ANILIST_USERNAME_ENV
            ));
        }
        if self.kitsu_username().is_none() {
            return Err(anyhow::anyhow!(
                "Kitsu username is not configured (run 'dualshelf config kitsu' or set {})",
                KITSU_USERNAME_ENV
            ));
        }
        Ok(())
    }

    /// Services with a username configured
    pub fn get_configured_services(&self) -> Vec<String> {
        let mut services = Vec::new();
        if self.anilist_username().is_some() {
            services.push("anilist".to_string());
        }
        if self.kitsu_username().is_some() {
            services.push("kitsu".to_string());
        }
        services
    }
}

pub fn validate_anilist_token(token: &str) -> anyhow::Result<()> {
    if token.trim().len() < MIN_ANILIST_TOKEN_LEN {
        return Err(anyhow::anyhow!(
            "AniList access token looks incorrect or is missing (expected at least {} characters)",
            MIN_ANILIST_TOKEN_LEN
        ));
    }
    Ok(())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
