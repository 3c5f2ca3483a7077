//! Error types for syno-download-station.

use crate::sniff::UnknownFileType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{}", render(.context.as_deref(), .kind))]
pub struct Error {
    pub kind: ErrorKind,
    /// Task operations this error travelled through, outermost first.
    pub context: Option<String>,
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
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, context: None, source: None }
    }

    /// Annotate the error with the task operation that produced it.
    pub fn context(mut self, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        self.context = Some(match self.context.take() {
            Some(inner) => format!("{operation}: {inner}"),
            None => operation,
        });
        self
    }

    /// Remote error code reported by the appliance, if any.
    pub fn remote_code(&self) -> Option<i64> {
        self.client_error().and_then(syno_client::Error::remote_code)
    }

    /// Returns true if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.client_error()
            .is_some_and(syno_client::Error::is_cancelled)
    }

    fn client_error(&self) -> Option<&syno_client::Error> {
        self.source.as_ref()?.downcast_ref::<syno_client::Error>()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),
    #[error("detect file type: unknown file type")]
    UnknownFileType,
    #[error("IO error: {0}")]
    Io(String),
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<syno_client::Error> for Error {
    fn from(err: syno_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            context: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<UnknownFileType> for Error {
    fn from(err: UnknownFileType) -> Self {
        Error {
            kind: ErrorKind::UnknownFileType,
            context: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            context: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Json(err.to_string()),
            context: None,
            source: Some(Box::new(err)),
        }
    }
}
