//! Error types for syno-client.

use serde::Deserialize;

/// Result type alias for syno-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for syno-client operations.
///
/// Each layer annotates the error with the operation it was performing, so
/// the rendered message reads like `call SYNO.Core.Certificate.import: API
/// error code: 117`. The original [`ErrorKind`] stays inspectable.
#[derive(Debug, thiserror::Error)]
#[error("{}", render(.context.as_deref(), .kind))]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Operations this error travelled through, outermost first.
    pub context: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

fn render(context: Option<&str>, kind: &ErrorKind) -> String {
    match context {
        Some(context) => format!("{context}: {kind}"),
        None => kind.to_string(),
    }
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            source: None,
        }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            context: None,
            source: Some(Box::new(source)),
        }
    }

    /// Annotate the error with the operation that produced it.
    pub fn context(mut self, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        self.context = Some(match self.context.take() {
            Some(inner) => format!("{operation}: {inner}"),
            None => operation,
        });
        self
    }

    /// Numeric code reported by the appliance, if this is a remote error.
    pub fn remote_code(&self) -> Option<i64> {
        match &self.kind {
            ErrorKind::Remote(remote) => Some(remote.code),
            _ => None,
        }
    }

    /// Returns true if the call was aborted through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Returns true if the HTTP status was outside the 2xx class.
    pub fn is_bad_status(&self) -> bool {
        matches!(self.kind, ErrorKind::BadStatus { .. })
    }

    /// Returns the HTTP status for bad-status errors.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::BadStatus { status } => Some(status),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP status outside the 2xx class.
    #[error("bad response status: {status}")]
    BadStatus { status: u16 },

    /// The envelope reported `success: false`.
    #[error(transparent)]
    Remote(RemoteError),

    /// The API name is not present in the discovered catalog.
    #[error("unknown API: {0}")]
    UnknownApi(String),

    /// The call was cancelled by its token.
    #[error("call cancelled")]
    Cancelled,

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Request could not be built or its body could not be sent.
    #[error("request error: {0}")]
    Request(String),

    /// Envelope or payload JSON was malformed.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Environment variable not set.
    #[error("environment variable not set: {0}")]
    EnvVar(String),

    /// IO error while producing a request body.
    #[error("IO error: {0}")]
    Io(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Error reported by the appliance inside the response envelope.
///
/// The appliance only returns a numeric code. [`RemoteError::description`]
/// knows the codes shared by every API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("API error code: {code}")]
pub struct RemoteError {
    /// Numeric error code.
    pub code: i64,
}

/// Code used when the envelope says `success: false` without an error object.
pub const UNKNOWN_ERROR_CODE: i64 = 100;

impl RemoteError {
    /// Create a remote error from its code.
    pub fn new(code: i64) -> Self {
        Self { code }
    }

    /// Description of the common codes, shared by all API families.
    pub fn description(&self) -> Option<&'static str> {
        match self.code {
            100 => Some("unknown error"),
            101 => Some("invalid parameter"),
            102 => Some("the requested API does not exist"),
            103 => Some("the requested method does not exist"),
            104 => Some("the requested version does not support the functionality"),
            105 => Some("the logged in session does not have permission"),
            106 => Some("session timeout"),
            107 => Some("session interrupted by duplicate login"),
            119 => Some("SID not found"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::BadStatus {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ErrorKind::Json(err.to_string())
        } else if err.is_builder() || err.is_request() || err.is_body() {
            ErrorKind::Request(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}
