//! Tenant access token exchange
//!
//! POSTs the app identity as JSON to the token endpoint and returns the
//! parsed envelope. The exchange itself carries no `Authorization` header.

use common::{Secret, truncate_body};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::JSON_CONTENT_TYPE;
use crate::error::{Error, Result};

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

/// Envelope returned by the token endpoint.
///
/// `expire` is a delta in seconds from the time the request was sent. The
/// caller converts it to an absolute instant when caching the credential.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub tenant_access_token: String,
    /// Seconds until the token expires (delta, not absolute)
    #[serde(default)]
    pub expire: i64,
}

/// Exchange the app identity for a tenant access token.
///
/// A non-zero envelope `code` becomes `Error::Rejected` with the endpoint's
/// message; a successful envelope is returned as-is.
pub async fn request_tenant_token(
    client: &reqwest::Client,
    token_url: &str,
    app_id: &str,
    app_secret: &Secret,
) -> Result<TokenResponse> {
    let body = serde_json::to_vec(&TokenRequest {
        app_id,
        app_secret: app_secret.expose(),
    })
    .map_err(|e| Error::TokenExchange(format!("encoding token request: {e}")))?;

    let response = client
        .post(token_url)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Error::Http(format!("token request timed out: {e}"))
            } else {
                Error::Http(format!("token request failed: {e}"))
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {}",
            truncate_body(&body)
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Http(format!("reading token response failed: {e}")))?;
    let token: TokenResponse = serde_json::from_slice(&bytes)
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))?;

    if token.code != 0 {
        return Err(Error::Rejected {
            code: token.code,
            msg: token.msg,
        });
    }
    if token.tenant_access_token.is_empty() {
        return Err(Error::TokenExchange(
            "token response missing tenant_access_token".into(),
        ));
    }

    debug!(expire = token.expire, "token endpoint issued tenant token");
    Ok(token)
}
