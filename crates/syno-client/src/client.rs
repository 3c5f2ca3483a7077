//! Synology web API client: discovery, session and call transport.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::catalog::{ApiCatalog, ApiDescriptor, ApiInfo};
use crate::config::ClientConfig;
use crate::credentials::SynoCredentials;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{encode, Field};
use crate::response::{check_envelope, ApiResponse};

/// Meta API that lists every other API.
pub const INFO_API: &str = "SYNO.API.Info";
/// Authentication API.
pub const AUTH_API: &str = "SYNO.API.Auth";
/// Fixed discovery path, relative to `/webapi/`.
pub const INFO_PATH: &str = "query.cgi";

/// Client for the Synology DSM web API.
///
/// Cloning is cheap: clones share the HTTP connection pool, the cookie jar,
/// the discovered API catalog and the login state. Discovery and login each
/// happen at most once per client, whichever clone triggers them.
///
/// # Example
///
/// ```rust,ignore
/// use syno_client::{Field, SynoClient, SynoCredentials};
///
/// let client = SynoClient::new(SynoCredentials::from_env()?)?;
///
/// let info: serde_json::Value = client
///     .call("SYNO.Core.System", "info", vec![Field::new("type", "network")])
///     .await?;
/// ```
#[derive(Clone)]
pub struct SynoClient {
    inner: Arc<Inner>,
    cancel: CancellationToken,
}

struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: SynoCredentials,
    catalog: ApiCatalog,
    session: crate::session::Session,
}

impl std::fmt::Debug for SynoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynoClient")
            .field("credentials", &self.inner.credentials)
            .field("authenticated", &self.inner.session.is_authenticated())
            .field("apis", &self.inner.catalog.len())
            .finish_non_exhaustive()
    }
}

impl SynoClient {
    /// Create a client with default configuration.
    pub fn new(credentials: SynoCredentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a client from `SYNOLOGY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(SynoCredentials::from_env()?)
    }

    /// Create a client with custom configuration.
    pub fn with_config(credentials: SynoCredentials, config: ClientConfig) -> Result<Self> {
        url::Url::parse(credentials.url())?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                credentials,
                catalog: ApiCatalog::new(),
                session: crate::session::Session::new(),
            }),
            cancel: CancellationToken::new(),
        })
    }

    /// A handle sharing this client's state whose calls abort when `token`
    /// is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: token,
        }
    }

    /// The token that aborts calls made through this handle.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Base URL of the appliance.
    pub fn base_url(&self) -> &str {
        self.inner.credentials.url()
    }

    /// Returns true once login succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    /// Full URL of an API path.
    ///
    /// Example: `api_url("entry.cgi")` -> `http://nas:5000/webapi/entry.cgi`
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/webapi/{}",
            self.base_url(),
            path.trim_start_matches('/')
        )
    }

    // =========================================================================
    // Discovery and Session
    // =========================================================================

    /// Resolve the descriptor of an API family, discovering all APIs on first use.
    pub async fn api_descriptor(&self, api: &str) -> Result<ApiDescriptor> {
        self.inner
            .catalog
            .resolve(api, || self.discover())
            .await
            .map_err(|e| e.context(format!("get API {api} version")))
    }

    async fn discover(&self) -> Result<HashMap<String, ApiInfo>> {
        let fields = vec![
            Field::new("api", INFO_API),
            Field::new("version", 1),
            Field::new("method", "query"),
        ];

        let response = self
            .post(INFO_PATH, fields)
            .await
            .map_err(|e| e.context("discover APIs"))?;
        response.data().map_err(|e| e.context("discover APIs"))
    }

    /// Log in unless this client already did.
    ///
    /// The session cookie is kept in the client's cookie store and sent with
    /// every later call. There is no automatic re-login; create a new client
    /// to switch credentials.
    pub async fn login(&self) -> Result<()> {
        self.inner
            .session
            .ensure_authenticated(|| self.authenticate())
            .await
            .map_err(|e| e.context("login"))
    }

    #[instrument(skip(self), fields(user = %self.inner.credentials.user()))]
    async fn authenticate(&self) -> Result<()> {
        let descriptor = self.api_descriptor(AUTH_API).await?;
        let credentials = &self.inner.credentials;
        let fields = vec![
            Field::new("account", credentials.user()),
            Field::new("passwd", credentials.password()),
            Field::new("format", "cookie"),
        ];

        let response = self.dispatch(&descriptor, None, "login", fields).await?;
        response.data::<serde_json::Value>()?;
        info!("Logged in");
        Ok(())
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Call `method` of `api` and decode the envelope payload into `T`.
    ///
    /// Discovers APIs and logs in first if needed. `api`, `version` (the
    /// highest the appliance supports) and `method` are sent ahead of
    /// `fields`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        api: &str,
        method: &str,
        fields: Vec<Field>,
    ) -> Result<T> {
        let response = self.invoke(api, None, method, fields).await?;
        response
            .data()
            .map_err(|e| e.context(format!("call {api}.{method}")))
    }

    /// Like [`call`](Self::call) but pinned to a specific API version.
    pub async fn call_with_version<T: DeserializeOwned>(
        &self,
        api: &str,
        version: i64,
        method: &str,
        fields: Vec<Field>,
    ) -> Result<T> {
        let response = self.invoke(api, Some(version), method, fields).await?;
        response
            .data()
            .map_err(|e| e.context(format!("call {api}.{method}")))
    }

    /// Call `method` of `api` and return the buffered response.
    ///
    /// Failed envelopes are still reported as errors. Bodies that are not
    /// envelopes are returned untouched.
    pub async fn call_raw(
        &self,
        api: &str,
        method: &str,
        fields: Vec<Field>,
    ) -> Result<ApiResponse> {
        self.invoke(api, None, method, fields).await
    }

    async fn invoke(
        &self,
        api: &str,
        version: Option<i64>,
        method: &str,
        fields: Vec<Field>,
    ) -> Result<ApiResponse> {
        let result = async {
            let descriptor = self.api_descriptor(api).await?;
            self.login().await?;
            self.dispatch(&descriptor, version, method, fields).await
        }
        .await;

        result.map_err(|e| e.context(format!("call {api}.{method}")))
    }

    async fn dispatch(
        &self,
        descriptor: &ApiDescriptor,
        version: Option<i64>,
        method: &str,
        fields: Vec<Field>,
    ) -> Result<ApiResponse> {
        let mut all = Vec::with_capacity(fields.len() + 3);
        all.push(Field::new("api", descriptor.name.as_str()));
        all.push(Field::new("version", version.unwrap_or(descriptor.max_version)));
        all.push(Field::new("method", method));
        all.extend(fields);

        self.post(&descriptor.path, all).await
    }

    /// POST fields to an API path and classify the outcome.
    #[instrument(skip(self, fields), fields(path = %path))]
    async fn post(&self, path: &str, fields: Vec<Field>) -> Result<ApiResponse> {
        let url = self.api_url(path);
        let body = encode(fields, &self.inner.config, &self.cancel);
        let multipart = body.is_multipart();
        let (content_type, body) = body.into_reqwest();

        if self.inner.config.enable_tracing {
            debug!(url = %url, multipart, "Sending request");
        }

        let request = self
            .inner
            .http
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .body(body);

        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();

            if !response.status().is_success() {
                if self.inner.config.enable_tracing {
                    info!(status, "Non-success response");
                }
                return Err(Error::new(ErrorKind::BadStatus { status }));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?;

            if self.inner.config.enable_tracing {
                debug!(status, content_length = body.len(), "Response received");
            }

            Ok::<_, Error>(ApiResponse::new(status, content_type, body))
        };

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::new(ErrorKind::Cancelled)),
            result = exchange => match result {
                // A cancelled upload also fails the body stream.
                Err(_) if self.cancel.is_cancelled() => {
                    return Err(Error::new(ErrorKind::Cancelled))
                }
                other => other?,
            },
        };

        check_envelope(response.bytes())?;
        Ok(response)
    }
}
