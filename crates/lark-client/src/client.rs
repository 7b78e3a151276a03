//! Authenticated request dispatcher and file upload
//!
//! Every call follows the same shape: get a bearer token from the
//! `TokenProvider`, send the request once, read the whole body, decode.
//! Nothing here retries; a failed call surfaces its typed error and the
//! caller decides what to do. The only cancellation is the client-wide
//! deadline from `ApiConfig::timeout_secs`, which covers connection setup
//! and the body read.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use common::{ApiConfig, Config, Secret};
use lark_auth::{CredentialManager, JSON_CONTENT_TYPE};
use provider::TokenProvider;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, instrument, warn};

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::message::MessageService;
use crate::metrics::{KIND_JSON, KIND_UPLOAD, record_request};
use crate::request::ApiRequest;
use crate::sheet::SheetService;

/// Name of the multipart field carrying the uploaded bytes
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default, alias = "image_key")]
    file_key: String,
}

/// Client for the Lark open platform.
///
/// Clone is cheap: the reqwest connection pool and the token provider are
/// shared between clones, so every clone reuses one cached credential.
#[derive(Clone)]
pub struct LarkClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl LarkClient {
    /// Client authenticating with a tenant access token for `app_id`.
    ///
    /// The token exchange and API calls share one HTTP connection pool.
    pub fn new(api: &ApiConfig, app_id: impl Into<String>, app_secret: Secret) -> Result<Self> {
        api.validate()?;
        let http = build_http_client(api)?;
        let tokens = Arc::new(CredentialManager::new(
            http.clone(),
            api.token_url(),
            app_id,
            app_secret,
        ));
        Ok(Self::assemble(api, http, tokens))
    }

    /// Client built from a loaded config file. Requires the `[app]` section.
    pub fn from_config(config: &Config) -> Result<Self> {
        let app = config
            .app
            .as_ref()
            .ok_or_else(|| Error::Config("missing [app] section".into()))?;
        Self::new(&config.api, app.app_id.clone(), app.app_secret.clone())
    }

    /// Client using an arbitrary token source (pre-issued tokens, tests).
    pub fn with_token_provider(api: &ApiConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        api.validate()?;
        let http = build_http_client(api)?;
        Ok(Self::assemble(api, http, tokens))
    }

    fn assemble(api: &ApiConfig, http: reqwest::Client, tokens: Arc<dyn TokenProvider>) -> Self {
        debug!(base_url = %api.base_url, provider = tokens.id(), "lark client initialized");
        Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_provider(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    pub fn messages(&self) -> MessageService<'_> {
        MessageService::new(self)
    }

    pub fn sheets(&self) -> SheetService<'_> {
        SheetService::new(self)
    }

    /// Send one authenticated JSON request and return the raw response body.
    ///
    /// Does not look at the envelope: a 2xx response with `code != 0` is
    /// still `Ok`. Non-2xx statuses fail with `Error::Network` before any
    /// decoding.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn dispatch(&self, request: ApiRequest) -> Result<Bytes> {
        let started = Instant::now();
        let method = request.method.clone();

        let result = self.dispatch_inner(request).await;

        record_request(
            KIND_JSON,
            method.as_str(),
            &result,
            started.elapsed().as_secs_f64(),
        );
        match &result {
            Ok(body) => debug!(bytes = body.len(), "request completed"),
            Err(e) => warn!(error = %e, "request failed"),
        }
        result
    }

    async fn dispatch_inner(&self, request: ApiRequest) -> Result<Bytes> {
        let token = self.bearer_token().await?;
        let ApiRequest { method, path, body } = request;

        let mut builder = self
            .http
            .request(method, self.url(&path))
            .bearer_auth(token)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Error::from_reqwest)?;
        read_body(response).await
    }

    /// Dispatch and decode the JSON body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let path = request.path.clone();
        let body = self.dispatch(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(path = %path, error = %e, "response did not match expected shape");
            Error::Decode(format!("decoding response from {path}: {e}"))
        })
    }

    /// Dispatch and discard the body.
    pub async fn execute(&self, request: ApiRequest) -> Result<()> {
        self.dispatch(request).await.map(|_| ())
    }

    /// Decode an `Envelope<T>` and return its data, mapping a non-zero code
    /// to `Error::Api`.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let envelope: Envelope<T> = self.send(request).await?;
        envelope.require_data()
    }

    /// Like `call` for endpoints whose `data` is irrelevant.
    pub async fn call_empty(&self, request: ApiRequest) -> Result<()> {
        let envelope: Envelope<IgnoredAny> = self.send(request).await?;
        envelope.into_data().map(|_| ())
    }

    /// Upload `bytes` as a single-part multipart form and return the file key.
    ///
    /// The whole buffer is sent in one request: no chunking, no resume.
    /// Each call gets a fresh multipart boundary.
    #[instrument(skip_all, fields(path = %path, file_name = %file_name, size = bytes.len()))]
    pub async fn upload(&self, path: &str, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        let started = Instant::now();

        let result = self.upload_inner(path, bytes, file_name).await;

        record_request(
            KIND_UPLOAD,
            "POST",
            &result,
            started.elapsed().as_secs_f64(),
        );
        match &result {
            Ok(_) => debug!("upload completed"),
            Err(e) => warn!(error = %e, "upload failed"),
        }
        result
    }

    async fn upload_inner(&self, path: &str, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        let token = self.bearer_token().await?;

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(Error::from_reqwest)?;
        let body = read_body(response).await?;

        let envelope: Envelope<UploadData> = serde_json::from_slice(&body)
            .map_err(|e| Error::Decode(format!("decoding upload response from {path}: {e}")))?;
        let data = envelope.require_data()?;
        if data.file_key.is_empty() {
            return Err(Error::Decode("upload response has no file_key".into()));
        }
        Ok(data.file_key)
    }

    async fn bearer_token(&self) -> Result<String> {
        self.tokens.access_token().await.map_err(Error::from)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn build_http_client(api: &ApiConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(api.timeout())
        .connect_timeout(api.timeout())
        .build()
        .map_err(|e| Error::Config(format!("building HTTP client: {e}")))
}

/// Read the full body, failing on non-2xx statuses.
async fn read_body(response: reqwest::Response) -> Result<Bytes> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::from_status(status, &body));
    }
    response.bytes().await.map_err(Error::from_reqwest)
}
