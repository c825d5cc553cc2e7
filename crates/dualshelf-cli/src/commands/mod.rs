pub mod audit;
pub mod audit_ui;
pub mod clear;
pub mod config;
pub mod prompts;
