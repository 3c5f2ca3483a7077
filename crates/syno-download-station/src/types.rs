//! Types for the Download Station task API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::sniff::FileType;

pub(crate) type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Task to create.
///
/// Without a file the task downloads `urls`. With a file the payload is
/// uploaded and its type is sniffed unless set explicitly.
///
/// Credentials here belong to the remote resource, not to the appliance.
#[derive(Default)]
pub struct NewDownloadTask {
    /// HTTP/FTP/magnet/ED2K links or paths starting with a shared folder.
    pub urls: Vec<String>,
    /// Task file to upload, such as a torrent.
    pub file: Option<BoxReader>,
    /// Type of `file`; detected from content when unset.
    pub file_type: Option<FileType>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Password for unzipping downloaded archives.
    pub unzip_password: Option<String>,
    /// Destination starting with a shared folder.
    pub destination: Option<String>,
}

impl NewDownloadTask {
    /// Task downloading the given links.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Task created from an uploaded file.
    pub fn from_file(file: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            file: Some(Box::new(file)),
            ..Default::default()
        }
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Credentials for the remote resource.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_unzip_password(mut self, password: impl Into<String>) -> Self {
        self.unzip_password = Some(password.into());
        self
    }
}

impl fmt::Debug for NewDownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewDownloadTask")
            .field("urls", &self.urls)
            .field("has_file", &self.file.is_some())
            .field("file_type", &self.file_type)
            .field("username", &self.username)
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

/// One page of download tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadTaskList {
    /// Number of tasks on the appliance.
    pub total: i64,
    pub offset: i64,
    #[serde(default)]
    pub tasks: Vec<DownloadTask>,
}

/// A Download Station task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadTask {
    pub id: String,
    #[serde(rename = "type", default)]
    pub task_type: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub size: i64,
    /// Status such as `waiting`, `downloading`, `finished` or `error`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additional: TaskAdditional,
}

impl DownloadTask {
    /// When the task was created, from the task details.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let detail = self.additional.detail.as_ref()?;
        DateTime::from_timestamp(detail.create_time, 0)
    }
}

/// Optional task sections requested through `additional`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskAdditional {
    #[serde(default)]
    pub detail: Option<TaskDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDetail {
    /// Unix seconds.
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub uri: String,
}
