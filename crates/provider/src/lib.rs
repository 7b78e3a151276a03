//! Token provider abstraction for authenticated API requests
//!
//! Defines the `TokenProvider` trait that decouples the request dispatcher
//! from where bearer tokens come from. The tenant credential manager in
//! `lark-auth` implements it with a cached token exchange; `StaticTokenProvider`
//! hands out a pre-issued token with no network access.

pub mod static_token;

pub use static_token::StaticTokenProvider;

use std::future::Future;
use std::pin::Pin;

/// Errors from token providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The credential could not be obtained. Carries the cause verbatim.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Boxed future returned by provider methods.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Source of bearer tokens for outbound requests.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn TokenProvider>`).
/// Implementations must be safe to call from many tasks at once and must only
/// ever hand out a token that was valid when it was returned.
pub trait TokenProvider: Send + Sync {
    /// Identifier for logging (e.g. "tenant", "static")
    fn id(&self) -> &str;

    /// Return a currently valid bearer token, acquiring one if needed.
    fn access_token(&self) -> TokenFuture<'_>;
}
