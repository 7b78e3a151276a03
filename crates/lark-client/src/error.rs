//! Error taxonomy for API calls
//!
//! Callers branch on the variant: `Auth` (no token), `Network` (the request
//! never produced a usable response), `Decode` (the response did not match the
//! expected shape), `Api` (a well-formed envelope with a non-zero code).

use common::truncate_body;
use provider::ProviderError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("Lark API error: code={code}, message={msg}")]
    Api { code: i64, msg: String },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Non-2xx HTTP status. Treated as a transport failure: the body is not
    /// decoded as an envelope, only echoed (truncated) into the message.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Error::Network(format!("HTTP {status}: {}", truncate_body(body)))
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Error::Network(format!("connection failed: {e}"))
        } else {
            Error::Network(format!("request failed: {e}"))
        }
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api { .. })
    }

    /// Envelope code for `Api` errors.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Auth(_) => "auth_error",
            Error::Network(_) => "network_error",
            Error::Decode(_) => "decode_error",
            Error::Api { .. } => "api_error",
            Error::Encode(_) => "encode_error",
            Error::Config(_) => "config_error",
        }
    }
}

impl From<ProviderError> for Error {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Auth(msg) => Error::Auth(msg),
        }
    }
}

impl From<common::Error> for Error {
    fn from(e: common::Error) -> Self {
        Error::Config(e.to_string())
    }
}
