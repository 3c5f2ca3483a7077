//! # syno-certs
//!
//! Synology DSM certificate management.
//!
//! ## Features
//!
//! - **List** - Installed certificates with parsed validity periods
//! - **Import** - Upload PEM certificate, key and optional chain; replaces a
//!   certificate with the same logical name
//! - **Delete** - By ID, or by logical name
//! - **Expiry checks** - For renewal decisions in higher layers
//!
//! ## Example
//!
//! ```rust,ignore
//! use syno_certs::{CertificateClient, NewCertificate};
//! use syno_client::SynoCredentials;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), syno_certs::Error> {
//!     let client = CertificateClient::new(SynoCredentials::from_env()?)?;
//!
//!     let expiring: Vec<_> = client
//!         .list()
//!         .await?
//!         .into_iter()
//!         .filter(|c| c.expires_within(chrono::Duration::days(30)))
//!         .collect();
//!
//!     for cert in expiring {
//!         println!("{} expires {}", cert.desc, cert.valid_till);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{CertificateClient, CERTIFICATE_API, CRT_API};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    parse_validity, Certificate, CertificateImport, Issuer, NewCertificate, ServerStatus, Service,
    Subject,
};
