//! Static provider: hands out one pre-issued token.
//!
//! Useful when the token is minted elsewhere (another service, a CLI flag) and
//! for driving the dispatcher without a token endpoint.

use common::Secret;

use crate::{ProviderError, TokenFuture, TokenProvider};

/// Provider returning a fixed bearer token, never touching the network.
pub struct StaticTokenProvider {
    token: Secret,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<Secret>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn id(&self) -> &str {
        "static"
    }

    fn access_token(&self) -> TokenFuture<'_> {
        let token = self.token.clone();
        Box::pin(async move {
            if token.is_empty() {
                return Err(ProviderError::Auth("static token is empty".into()));
            }
            Ok(token.expose().to_string())
        })
    }
}
