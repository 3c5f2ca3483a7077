//! # syno-download-station
//!
//! Synology Download Station task management.
//!
//! ## Features
//!
//! - **Link downloads** - HTTP/FTP/magnet/ED2K links into a shared folder
//! - **File uploads** - Torrent, NZB and link-list files, streamed to the appliance
//! - **Type detection** - Content sniffing when the file type is not given
//! - **Listing** - Paged task listing with details
//!
//! ## Example
//!
//! ```rust,ignore
//! use syno_client::SynoCredentials;
//! use syno_download_station::{DownloadStationClient, NewDownloadTask};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), syno_download_station::Error> {
//!     let ds = DownloadStationClient::new(SynoCredentials::from_env()?)?;
//!
//!     let torrent = tokio::fs::File::open("debian.torrent").await?;
//!     ds.create(NewDownloadTask::from_file(torrent).with_destination("Downloads"))
//!         .await?;
//!
//!     for task in ds.list_all(None).await? {
//!         println!("{} {} {}", task.id, task.status, task.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod sniff;
mod types;

pub use client::{DownloadStationClient, TASK_API, TASK_V2_API};
pub use error::{Error, ErrorKind, Result};
pub use sniff::{detect, FileType, UnknownFileType, PEEK_SIZE};
pub use types::*;
