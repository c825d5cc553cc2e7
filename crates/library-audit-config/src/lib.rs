pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{AniListConfig, AuditOptions, Config, KitsuConfig, validate_anilist_token, MIN_ANILIST_TOKEN_LEN};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
