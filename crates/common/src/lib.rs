//! Shared types for the Lark client workspace
//!
//! Holds the pieces every other crate needs: the `Secret` wrapper used for
//! app secrets and bearer tokens, and the client configuration that replaces
//! hard-coded endpoint URLs.

pub mod body;
mod config;
mod error;
mod secret;

pub use body::truncate_body;
pub use config::{
    ApiConfig, AppConfig, Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, TENANT_ACCESS_TOKEN_PATH,
};
pub use error::{Error, Result};
pub use secret::Secret;
