//! Shared types for the lightdeck dashboard server.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod store_keys;
pub mod types;

pub use config::{ServerConfig, SshConfig, StoreBackend};
pub use store_keys::{keys, validate_project_id};
pub use types::*;
