//! Types for the certificate API.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::io::AsyncRead;

/// Certificate issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub organization: String,
}

/// Certificate subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub sub_alt_name: Vec<String>,
}

/// A DSM service bound to a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name_i18n: String,
    #[serde(rename = "isPkg", default)]
    pub is_pkg: bool,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub subscriber: String,
    #[serde(default)]
    pub multiple_cert: bool,
    #[serde(default)]
    pub user_setable: bool,
}

/// Certificate installed on the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    /// Logical name chosen at import time.
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub is_broken: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub issuer: Issuer,
    #[serde(default)]
    pub key_types: String,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub signature_algorithm: String,
    #[serde(default)]
    pub subject: Subject,
    #[serde(default)]
    pub user_deletable: bool,
    #[serde(deserialize_with = "deserialize_validity")]
    pub valid_from: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_validity")]
    pub valid_till: DateTime<Utc>,
}

impl Certificate {
    /// Returns true if the certificate is past its validity period.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the certificate is expired at `at`.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at > self.valid_till
    }

    /// Returns true if the certificate expires within `window` from now.
    ///
    /// Already expired certificates count as expiring.
    pub fn expires_within(&self, window: Duration) -> bool {
        self.is_expired_at(Utc::now() + window)
    }
}

/// Parse a validity timestamp such as `Mar  5 12:00:00 2024 GMT`.
///
/// The appliance always reports GMT; the zone token is not interpreted.
pub fn parse_validity(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let stamp = raw.split_whitespace().take(4).collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&stamp, "%b %d %H:%M:%S %Y").map(|t| t.and_utc())
}

fn deserialize_validity<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_validity(&raw).map_err(|e| {
        serde::de::Error::custom(format!("invalid certificate timestamp {raw:?}: {e}"))
    })
}

/// Payload of `SYNO.Core.Certificate.CRT` / `list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CertificateList {
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}

/// Whether the web server restarted to apply a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(rename = "restart_httpd", default)]
    pub server_restarted: bool,
}

/// Result of a certificate import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateImport {
    /// ID of the created or replaced certificate.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "restart_httpd", default)]
    pub server_restarted: bool,
}

type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Certificate to import.
///
/// Importing replaces an existing certificate with the same logical name.
///
/// # Example
///
/// ```rust,ignore
/// let cert = tokio::fs::File::open("fullchain.pem").await?;
/// let key = tokio::fs::File::open("privkey.pem").await?;
///
/// let draft = NewCertificate::new("web", cert, key).as_default(true);
/// ```
pub struct NewCertificate {
    /// Unique logical name, stored as the certificate description.
    pub name: String,
    /// Make the certificate the system default.
    pub as_default: bool,
    /// PEM certificate.
    pub cert: BoxReader,
    /// PEM private key.
    pub key: BoxReader,
    /// Optional PEM intermediate chain.
    pub ca: Option<BoxReader>,
}

impl NewCertificate {
    pub fn new(
        name: impl Into<String>,
        cert: impl AsyncRead + Send + Unpin + 'static,
        key: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            as_default: false,
            cert: Box::new(cert),
            key: Box::new(key),
            ca: None,
        }
    }

    /// Attach an intermediate certificate chain.
    pub fn with_ca(mut self, ca: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.ca = Some(Box::new(ca));
        self
    }

    pub fn as_default(mut self, as_default: bool) -> Self {
        self.as_default = as_default;
        self
    }
}

impl fmt::Debug for NewCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewCertificate")
            .field("name", &self.name)
            .field("as_default", &self.as_default)
            .field("has_ca", &self.ca.is_some())
            .finish_non_exhaustive()
    }
}
