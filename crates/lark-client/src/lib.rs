//! Authenticated client for the Lark (Feishu) open platform API
//!
//! `LarkClient` obtains a tenant access token through a `TokenProvider`
//! (normally the caching `lark_auth::CredentialManager`), attaches it to every
//! outbound call, and turns transport and protocol failures into a typed
//! `Error` callers can branch on.
//!
//! Request flow:
//! 1. Caller builds an `ApiRequest` (method, path, optional JSON body)
//! 2. `LarkClient::dispatch()` fetches a token and sends the request once
//! 3. `send()` decodes the body; `call()` also unwraps the `Envelope`
//! 4. `upload()` does the same with a multipart body and returns the file key
//!
//! The messaging and spreadsheet helpers in `message` and `sheet` are thin
//! wrappers that build a payload and go through `call()`.

pub mod client;
pub mod envelope;
pub mod error;
pub mod message;
pub mod metrics;
pub mod request;
pub mod sheet;

#[cfg(test)]
mod test_server;

pub use client::LarkClient;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use message::{
    CreateGroupRequest, MessageCard, MessageContent, MessageService, MessageType, PostBody,
    PostContent, PostElement,
};
pub use request::ApiRequest;
pub use sheet::{CellStyle, Color, Dimension, SheetInfo, SheetService, Spreadsheet};

pub use common::{ApiConfig, Config, Secret};
pub use provider::{StaticTokenProvider, TokenProvider};
