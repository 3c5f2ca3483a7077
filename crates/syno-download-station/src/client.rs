//! Download Station client.
//!
//! Link downloads go through the legacy `SYNO.DownloadStation.Task` API.
//! File uploads need `SYNO.DownloadStation2.Task`, which is undocumented;
//! its field layout mirrors what the DSM web UI sends.

use std::io::Cursor;

use chrono::Utc;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use syno_client::{ClientConfig, Field, SynoClient, SynoCredentials};

use crate::error::{Error, Result};
use crate::sniff::{detect, FileType, PEEK_SIZE};
use crate::types::*;

/// Legacy task API: link downloads and listing.
pub const TASK_API: &str = "SYNO.DownloadStation.Task";
/// Task API accepting file uploads.
pub const TASK_V2_API: &str = "SYNO.DownloadStation2.Task";

/// Default page size for [`DownloadStationClient::list_all`].
const DEFAULT_PAGE_SIZE: i64 = 100;

/// Synology Download Station client.
///
/// # Example
///
/// ```rust,ignore
/// use syno_download_station::{DownloadStationClient, NewDownloadTask};
///
/// let ds = DownloadStationClient::new(SynoCredentials::from_env()?)?;
///
/// ds.download("Downloads", ["https://example.com/image.iso"]).await?;
///
/// let torrent = tokio::fs::File::open("image.torrent").await?;
/// ds.create(NewDownloadTask::from_file(torrent).with_destination("Downloads"))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct DownloadStationClient {
    client: SynoClient,
}

impl DownloadStationClient {
    /// Create a new Download Station client.
    pub fn new(credentials: SynoCredentials) -> Result<Self> {
        Ok(Self::from_client(SynoClient::new(credentials)?))
    }

    /// Create a new Download Station client with custom HTTP configuration.
    pub fn with_config(credentials: SynoCredentials, config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(SynoClient::with_config(credentials, config)?))
    }

    /// Create a Download Station client sharing an existing SynoClient.
    pub fn from_client(client: SynoClient) -> Self {
        Self { client }
    }

    /// Get the underlying SynoClient.
    pub fn inner(&self) -> &SynoClient {
        &self.client
    }

    // =========================================================================
    // Task Creation
    // =========================================================================

    /// Download links into `destination`.
    pub async fn download<I, S>(&self, destination: &str, urls: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.create(NewDownloadTask::from_urls(urls).with_destination(destination))
            .await
    }

    /// Create a task from links or from an uploaded file.
    #[instrument(skip(self, task))]
    pub async fn create(&self, mut task: NewDownloadTask) -> Result<()> {
        let result = match task.file.take() {
            Some(file) => self.create_from_file(file, task).await,
            None => self.create_from_urls(task).await,
        };
        result.map_err(|e| e.context("create download task"))
    }

    async fn create_from_urls(&self, task: NewDownloadTask) -> Result<()> {
        let mut fields = Vec::new();
        if !task.urls.is_empty() {
            fields.push(Field::new("uri", task.urls.join(",")));
        }
        push_if_set(&mut fields, "destination", task.destination);
        push_if_set(&mut fields, "username", task.username);
        push_if_set(&mut fields, "password", task.password);
        push_if_set(&mut fields, "unzip_password", task.unzip_password);

        self.client.call_raw(TASK_API, "create", fields).await?;
        Ok(())
    }

    async fn create_from_file(&self, mut file: BoxReader, task: NewDownloadTask) -> Result<()> {
        let NewDownloadTask {
            file_type,
            username,
            password,
            unzip_password,
            destination,
            ..
        } = task;

        let mut fields = Vec::new();
        push_if_set(&mut fields, "username", username);
        push_if_set(&mut fields, "password", password);
        if let Some(destination) = destination.filter(|d| !d.is_empty()) {
            fields.push(Field::new("destination", serde_json::to_string(&destination)?));
        }
        push_if_set(&mut fields, "unzip_password", unzip_password);
        fields.push(Field::new("type", r#""file""#));

        let file_type = match file_type {
            Some(file_type) => file_type,
            None => {
                let mut peek = Vec::with_capacity(PEEK_SIZE);
                let mut head = (&mut file).take(PEEK_SIZE as u64);
                let read = head.read_to_end(&mut peek);
                tokio::select! {
                    _ = self.client.cancellation_token().cancelled() => {
                        return Err(syno_client::Error::new(syno_client::ErrorKind::Cancelled).into());
                    }
                    result = read => { result?; }
                }

                let file_type = detect(&peek)?;
                debug!(%file_type, "File type detected");

                // Put the peeked bytes back in front of the rest.
                file = Box::new(Cursor::new(peek).chain(file));
                file_type
            }
        };

        fields.push(Field::new("create_list", false));
        fields.push(Field::new("file", serde_json::to_string(&[file_type.as_str()])?));
        fields.push(Field::attachment(
            file_type.as_str(),
            upload_file_name(file_type),
            file,
        ));

        self.client.call_raw(TASK_V2_API, "create", fields).await?;
        Ok(())
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List tasks with details. A `limit` of -1 returns all remaining tasks.
    #[instrument(skip(self))]
    pub async fn list(&self, offset: i64, limit: i64) -> Result<DownloadTaskList> {
        let fields = vec![
            Field::new("offset", offset),
            Field::new("limit", limit),
            Field::new("additional", "detail"),
        ];
        let list = self
            .client
            .call(TASK_API, "list", fields)
            .await
            .map_err(|e| Error::from(e).context("list download tasks"))?;
        Ok(list)
    }

    /// List every task, fetching `page_size` tasks per call.
    pub async fn list_all(&self, page_size: Option<i64>) -> Result<Vec<DownloadTask>> {
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let mut tasks = Vec::new();

        loop {
            let page = self.list(tasks.len() as i64, page_size).await?;
            let received = page.tasks.len();
            tasks.extend(page.tasks);

            if received == 0 || tasks.len() as i64 >= page.total {
                break;
            }
        }

        Ok(tasks)
    }
}

fn push_if_set(fields: &mut Vec<Field>, name: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        fields.push(Field::new(name, value));
    }
}

fn upload_file_name(file_type: FileType) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{nanos}.{file_type}")
}
