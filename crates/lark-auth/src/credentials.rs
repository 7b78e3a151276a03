//! In-memory tenant credential cache
//!
//! `CredentialManager` owns the only copy of the current credential. A tokio
//! Mutex serializes the whole "check cache, exchange if stale, install"
//! sequence, so callers racing an empty or expired cache share one exchange
//! instead of each running their own, and nobody can observe a token paired
//! with another exchange's expiry.
//!
//! Expired credentials are discarded, never patched: a refresh builds a new
//! `Credential` and swaps it in whole.

use std::time::{Duration, Instant};

use common::Secret;
use provider::{ProviderError, TokenFuture, TokenProvider};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::MAX_TOKEN_LIFETIME_SECS;
use crate::error::Result;
use crate::token::request_tenant_token;

/// A bearer token and the instant it stops being usable.
///
/// Valid strictly before `expires_at`.
#[derive(Debug, Clone)]
pub struct Credential {
    token: Secret,
    expires_at: Instant,
}

impl Credential {
    /// Build a credential issued at `issued_at` with the endpoint-reported
    /// lifetime. Zero or negative lifetimes yield an already-expired credential.
    pub fn new(token: Secret, lifetime_secs: i64, issued_at: Instant) -> Self {
        let lifetime = lifetime_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS) as u64;
        Self {
            token,
            expires_at: issued_at + Duration::from_secs(lifetime),
        }
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        !self.token.is_empty() && now < self.expires_at
    }

    pub fn token(&self) -> &Secret {
        &self.token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

/// Acquires and caches the tenant access token for one app identity.
///
/// The app identity is fixed at construction. The HTTP client is shared with
/// whatever else the caller uses it for (it is an `Arc` internally).
pub struct CredentialManager {
    http: reqwest::Client,
    token_url: String,
    app_id: String,
    app_secret: Secret,
    current: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: Secret,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            app_id: app_id.into(),
            app_secret,
            current: Mutex::new(None),
        }
    }

    /// Return a valid tenant token, exchanging for a new one if the cached
    /// credential is missing or expired.
    ///
    /// A failed exchange caches nothing and is returned to the caller as-is.
    pub async fn acquire(&self) -> Result<String> {
        let mut current = self.current.lock().await;

        if let Some(credential) = current.as_ref() {
            if credential.is_valid_at(Instant::now()) {
                metrics::counter!("lark_token_cache_hits_total").increment(1);
                return Ok(credential.token().expose().to_string());
            }
            debug!(app_id = %self.app_id, "cached tenant token expired");
        }
        *current = None;

        debug!(app_id = %self.app_id, "requesting tenant token");
        let sent_at = Instant::now();
        let response =
            match request_tenant_token(&self.http, &self.token_url, &self.app_id, &self.app_secret)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    metrics::counter!("lark_token_exchanges_total", "outcome" => "failure")
                        .increment(1);
                    warn!(app_id = %self.app_id, error = %e, "tenant token exchange failed");
                    return Err(e);
                }
            };
        metrics::counter!("lark_token_exchanges_total", "outcome" => "success").increment(1);

        let credential = Credential::new(
            Secret::new(response.tenant_access_token),
            response.expire,
            sent_at,
        );
        if response.expire <= 0 {
            warn!(
                app_id = %self.app_id,
                expire = response.expire,
                "token endpoint reported non-positive lifetime, token will not be reused"
            );
        } else {
            info!(app_id = %self.app_id, expire_secs = response.expire, "tenant token acquired");
        }

        let token = credential.token().expose().to_string();
        *current = Some(credential);
        Ok(token)
    }

    /// Drop the cached credential so the next `acquire()` exchanges again.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        if current.take().is_some() {
            debug!(app_id = %self.app_id, "tenant token invalidated");
        }
    }

    /// Snapshot of the cached credential, if any (expired or not).
    pub async fn cached(&self) -> Option<Credential> {
        self.current.lock().await.clone()
    }
}

impl TokenProvider for CredentialManager {
    fn id(&self) -> &str {
        "tenant"
    }

    fn access_token(&self) -> TokenFuture<'_> {
        Box::pin(async move {
            self.acquire()
                .await
                .map_err(|e| ProviderError::Auth(e.to_string()))
        })
    }
}
