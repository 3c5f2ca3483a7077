//! # syno-api
//!
//! A Synology DSM web API client library for Rust.
//!
//! API families are discovered at runtime; the client logs in once with a
//! session cookie and shares that session between every clone and wrapper.
//!
//! ## Security
//!
//! - Passwords are redacted in Debug output
//! - Tracing skips credential and payload parameters
//! - TLS certificates are verified unless explicitly disabled for
//!   self-signed appliances
//!
//! ## Crates
//!
//! - **syno-client** - Core client: discovery, cookie session, request encoding, envelopes
//! - **syno-certs** - Certificate management: list, import, delete
//! - **syno-download-station** - Download Station: link and file tasks, listing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use syno_api::{SynoClient, SynoClientExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SynoClient::from_env()?;
//!
//!     for cert in client.certificates().list().await? {
//!         println!("{} expires {}", cert.desc, cert.valid_till);
//!     }
//!
//!     client
//!         .download_station()
//!         .download("Downloads", ["https://example.com/image.iso"])
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
pub use syno_client as client;

#[cfg(feature = "certs")]
pub use syno_certs as certs;

#[cfg(feature = "download-station")]
pub use syno_download_station as download_station;

// Re-export commonly used types at the top level
pub use syno_client::{CancellationToken, ClientConfig, Field, SynoClient, SynoCredentials};

#[cfg(feature = "certs")]
pub use syno_certs::CertificateClient;

#[cfg(feature = "download-station")]
pub use syno_download_station::DownloadStationClient;

/// Access the API family wrappers from a [`SynoClient`].
///
/// Wrappers share the client's session, so logging in through one logs in
/// all of them.
pub trait SynoClientExt {
    /// Certificate management.
    #[cfg(feature = "certs")]
    fn certificates(&self) -> CertificateClient;

    /// Download Station task management.
    #[cfg(feature = "download-station")]
    fn download_station(&self) -> DownloadStationClient;
}

impl SynoClientExt for SynoClient {
    #[cfg(feature = "certs")]
    fn certificates(&self) -> CertificateClient {
        CertificateClient::from_client(self.clone())
    }

    #[cfg(feature = "download-station")]
    fn download_station(&self) -> DownloadStationClient {
        DownloadStationClient::from_client(self.clone())
    }
}
