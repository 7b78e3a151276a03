//! Tenant access token management for the Lark open platform
//!
//! Exchanges an app identity (app id + app secret) for a short-lived
//! tenant-level bearer token and caches it in memory until it expires.
//! Nothing is persisted: a restarted process simply exchanges again.
//!
//! Credential flow:
//! 1. Caller asks `CredentialManager::acquire()` for a token
//! 2. Cached credential still valid → returned without network access
//! 3. Otherwise `token::request_tenant_token()` runs one exchange
//! 4. The new `Credential` replaces the old one as a unit
//!
//! Refresh is lazy: there is no background task, so the first call after
//! expiry pays for one extra round trip.

pub mod constants;
pub mod credentials;
pub mod error;
pub mod token;

#[cfg(test)]
mod test_server;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use constants::*;
pub use credentials::{Credential, CredentialManager};
pub use error::{Error, Result};
pub use token::{TokenResponse, request_tenant_token};
