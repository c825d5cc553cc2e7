pub mod api;
pub mod auth;
pub mod client;

pub use auth::{password_grant, TokenInfo};
pub use client::KitsuClient;
