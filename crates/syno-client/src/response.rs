//! Response envelope handling.
//!
//! Every API answers with `{"success": bool, "error": {"code": n}, "data": ...}`.
//! [`ApiResponse`] keeps the complete body so callers can inspect the
//! envelope and still read the raw bytes afterwards.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, ErrorKind, RemoteError, Result, UNKNOWN_ERROR_CODE};

/// Uniform response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Whether the call succeeded.
    pub success: bool,
    /// Error details, present when `success` is false.
    #[serde(default)]
    pub error: Option<RemoteError>,
    /// Payload, meaningful only when `success` is true.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Parse an envelope from a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(Into::into)
    }

    /// The remote error if the call failed.
    ///
    /// A failed envelope without an error object maps to code 100.
    pub fn remote_error(&self) -> Option<RemoteError> {
        if self.success {
            None
        } else {
            Some(
                self.error
                    .unwrap_or_else(|| RemoteError::new(UNKNOWN_ERROR_CODE)),
            )
        }
    }

    /// Turn the envelope into its payload or its remote error.
    pub fn into_data(self) -> Result<Value> {
        match self.remote_error() {
            Some(remote) => Err(Error::new(ErrorKind::Remote(remote))),
            None => Ok(self.data),
        }
    }

    /// Deserialize the payload into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let data = self.into_data()?;
        serde_json::from_value(data).map_err(Into::into)
    }
}

/// Fail with the remote error if `body` is a failed envelope.
///
/// Bodies that are not envelopes at all pass the check; some endpoints
/// stream raw content.
pub fn check_envelope(body: &[u8]) -> Result<()> {
    match Envelope::from_slice(body) {
        Ok(envelope) => match envelope.remote_error() {
            Some(remote) => Err(Error::new(ErrorKind::Remote(remote))),
            None => Ok(()),
        },
        Err(_) => Ok(()),
    }
}

/// Buffered successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    content_type: Option<String>,
    body: Bytes,
}

impl ApiResponse {
    /// Create a response from its parts.
    pub fn new(status: u16, content_type: Option<String>, body: Bytes) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The complete body. Can be read any number of times.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response, returning the body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body).map_err(|e| {
            Error::with_source(
                ErrorKind::Other("response body is not valid UTF-8".to_string()),
                e,
            )
        })
    }

    /// Parse the body as an envelope.
    pub fn envelope(&self) -> Result<Envelope> {
        Envelope::from_slice(&self.body)
    }

    /// Deserialize the whole body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    /// Deserialize the envelope payload.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        self.envelope()?.decode()
    }
}
