//! The `{code, msg, data}` wrapper every endpoint responds with

use serde::Deserialize;

use crate::error::{Error, Result};

/// Response envelope. `code == 0` means success; `data` is endpoint-specific.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Turn a non-zero code into `Error::Api`, otherwise hand back `data`.
    pub fn into_data(self) -> Result<Option<T>> {
        if self.code != 0 {
            return Err(Error::Api {
                code: self.code,
                msg: self.msg,
            });
        }
        Ok(self.data)
    }

    /// Like `into_data`, but a successful envelope without `data` is a decode error.
    pub fn require_data(self) -> Result<T> {
        self.into_data()?
            .ok_or_else(|| Error::Decode("successful response has no data".into()))
    }
}
