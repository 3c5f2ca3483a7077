//! Certificate management client.
//!
//! Wraps `SYNO.Core.Certificate` and `SYNO.Core.Certificate.CRT`. Certificates
//! are addressed either by their appliance-assigned ID or by the logical name
//! stored in their description.

use tracing::{debug, instrument};

use syno_client::{ClientConfig, Field, SynoClient, SynoCredentials};

use crate::error::{Error, ErrorKind, Result};
use crate::types::*;

/// API used for listing and deleting certificates.
pub const CRT_API: &str = "SYNO.Core.Certificate.CRT";
/// API used for importing certificates.
pub const CERTIFICATE_API: &str = "SYNO.Core.Certificate";

/// Synology certificate API client.
///
/// # Example
///
/// ```rust,ignore
/// use syno_certs::{CertificateClient, NewCertificate};
///
/// let client = CertificateClient::new(SynoCredentials::from_env()?)?;
///
/// let cert = tokio::fs::File::open("fullchain.pem").await?;
/// let key = tokio::fs::File::open("privkey.pem").await?;
/// let imported = client.import(NewCertificate::new("web", cert, key)).await?;
///
/// for cert in client.list().await? {
///     println!("{} {} expires {}", cert.id, cert.desc, cert.valid_till);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CertificateClient {
    client: SynoClient,
}

impl CertificateClient {
    /// Create a new certificate client.
    pub fn new(credentials: SynoCredentials) -> Result<Self> {
        Ok(Self::from_client(SynoClient::new(credentials)?))
    }

    /// Create a new certificate client with custom HTTP configuration.
    pub fn with_config(credentials: SynoCredentials, config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(SynoClient::with_config(credentials, config)?))
    }

    /// Create a certificate client sharing an existing SynoClient.
    pub fn from_client(client: SynoClient) -> Self {
        Self { client }
    }

    /// Get the underlying SynoClient.
    pub fn inner(&self) -> &SynoClient {
        &self.client
    }

    /// List installed certificates.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Certificate>> {
        let list: CertificateList = self
            .client
            .call(CRT_API, "list", Vec::new())
            .await
            .map_err(|e| Error::from(e).context("list certificates"))?;
        Ok(list.certificates)
    }

    /// Find the first certificate whose logical name equals `name`.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Certificate>> {
        let list = self.list().await?;
        Ok(list.into_iter().find(|c| c.desc == name))
    }

    /// Import a certificate, replacing one with the same logical name.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn import(&self, draft: NewCertificate) -> Result<CertificateImport> {
        let operation = format!("import certificate {}", draft.name);
        let existing = self
            .find_by_name(&draft.name)
            .await
            .map_err(|e| e.context(operation.as_str()))?;

        let mut fields = vec![
            Field::attachment("key", "server.key", draft.key),
            Field::attachment("cert", "server.crt", draft.cert),
        ];
        if let Some(ca) = draft.ca {
            fields.push(Field::attachment("inter_cert", "ca.crt", ca));
        }
        fields.push(Field::new("desc", draft.name.as_str()));
        if draft.as_default {
            fields.push(Field::new("as_default", "true"));
        }
        if let Some(existing) = &existing {
            debug!(id = %existing.id, "Replacing existing certificate");
            fields.push(Field::new("id", existing.id.as_str()));
        }

        let import = self
            .client
            .call(CERTIFICATE_API, "import", fields)
            .await
            .map_err(|e| Error::from(e).context(operation))?;
        Ok(import)
    }

    /// Delete a certificate by its ID.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<ServerStatus> {
        let ids = serde_json::to_string(&[id])?;
        let status = self
            .client
            .call(CRT_API, "delete", vec![Field::new("ids", ids)])
            .await
            .map_err(|e| Error::from(e).context(format!("delete certificate {id}")))?;
        Ok(status)
    }

    /// Delete a certificate by ID or, failing that, by logical name.
    ///
    /// An exact ID match wins over a name match.
    #[instrument(skip(self))]
    pub async fn delete(&self, id_or_name: &str) -> Result<ServerStatus> {
        let list = self.list().await?;
        let id = list
            .iter()
            .find(|c| c.id == id_or_name)
            .or_else(|| list.iter().find(|c| c.desc == id_or_name))
            .map(|c| c.id.clone())
            .ok_or_else(|| Error::new(ErrorKind::NoMatchingCertificate(id_or_name.to_string())))?;

        self.delete_by_id(&id).await
    }
}
