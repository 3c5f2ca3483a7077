//! # syno-client
//!
//! Core HTTP client for the Synology DSM web API.
//!
//! This crate provides:
//! - One-time API discovery through `SYNO.API.Info`
//! - Cookie session login, shared by every clone of a client
//! - Form or streamed multipart request encoding
//! - Envelope decoding with typed remote error codes
//! - Cooperative cancellation of in-flight calls
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (syno-certs, syno-download-station)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SynoClient                            │
//! │  - ApiCatalog: name -> path + max version (discover once)   │
//! │  - Session: login once, cookie in the HTTP cookie store     │
//! │  - call / call_raw / call_with_version                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 encode  +  ApiResponse                      │
//! │  - urlencoded form, or multipart streamed through a pipe    │
//! │  - bad status first, then the success/error envelope        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use syno_client::{Field, SynoClient, SynoCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), syno_client::Error> {
//!     let client = SynoClient::new(SynoCredentials::from_env()?)?;
//!
//!     let info: serde_json::Value = client
//!         .call("SYNO.Core.System", "info", vec![Field::new("type", "network")])
//!         .await?;
//!
//!     println!("{info}");
//!     Ok(())
//! }
//! ```

mod catalog;
mod client;
mod config;
mod credentials;
mod error;
mod request;
mod response;
mod session;

pub use catalog::{ApiCatalog, ApiDescriptor, ApiInfo};
pub use client::{SynoClient, AUTH_API, INFO_API, INFO_PATH};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use credentials::{SynoCredentials, DEFAULT_URL, ENV_PASSWORD, ENV_URL, ENV_USER};
pub use error::{Error, ErrorKind, RemoteError, Result, UNKNOWN_ERROR_CODE};
pub use request::{
    encode, needs_streaming, EncodedBody, Field, FieldValue, RequestBody, FORM_CONTENT_TYPE,
};
pub use response::{check_envelope, ApiResponse, Envelope};
pub use session::Session;

// Re-export for convenience
pub use tokio_util::sync::CancellationToken;

/// Default User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("syno-api/", env!("CARGO_PKG_VERSION"));
