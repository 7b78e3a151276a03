//! Error types for tenant token operations

/// Errors from the token exchange.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The endpoint answered with a non-zero envelope code.
    #[error("token exchange rejected (code {code}): {msg}")]
    Rejected { code: i64, msg: String },
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
