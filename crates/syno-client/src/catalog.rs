//! API descriptor catalog.
//!
//! The appliance publishes every API family it supports through a single
//! discovery endpoint. The catalog performs that call once per client and
//! publishes the result as an immutable map; later lookups never lock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Wire path and supported versions of one API family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiDescriptor {
    /// API name, e.g. `SYNO.API.Auth`.
    pub name: String,
    /// Highest version the appliance supports.
    pub max_version: i64,
    /// Lowest version the appliance supports.
    pub min_version: i64,
    /// Path relative to `/webapi/`, e.g. `entry.cgi`.
    pub path: String,
}

/// One entry of the discovery response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    pub max_version: i64,
    #[serde(default = "default_min_version")]
    pub min_version: i64,
    pub path: String,
}

fn default_min_version() -> i64 {
    1
}

/// Lazily populated map of API name to descriptor.
#[derive(Debug, Default)]
pub struct ApiCatalog {
    descriptors: OnceLock<HashMap<String, ApiDescriptor>>,
    lock: Mutex<()>,
}

impl ApiCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once discovery has succeeded.
    pub fn is_populated(&self) -> bool {
        self.descriptors.get().is_some()
    }

    /// Number of known API families (zero before discovery).
    pub fn len(&self) -> usize {
        self.descriptors.get().map_or(0, HashMap::len)
    }

    /// Returns true if nothing has been discovered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve an API name, running `discover` if the catalog is still empty.
    ///
    /// Concurrent first callers wait for a single discovery. A failed
    /// discovery leaves the catalog empty so the next caller retries.
    pub async fn resolve<F, Fut>(&self, name: &str, discover: F) -> Result<ApiDescriptor>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<HashMap<String, ApiInfo>>>,
    {
        if let Some(map) = self.descriptors.get() {
            return lookup(map, name);
        }

        let _guard = self.lock.lock().await;
        if let Some(map) = self.descriptors.get() {
            return lookup(map, name);
        }

        let discovered = discover().await?;
        debug!(apis = discovered.len(), "API catalog populated");

        let map = discovered
            .into_iter()
            .map(|(name, info)| {
                let descriptor = ApiDescriptor {
                    name: name.clone(),
                    max_version: info.max_version,
                    min_version: info.min_version,
                    path: info.path,
                };
                (name, descriptor)
            })
            .collect();

        lookup(self.descriptors.get_or_init(|| map), name)
    }
}

fn lookup(map: &HashMap<String, ApiDescriptor>, name: &str) -> Result<ApiDescriptor> {
    map.get(name)
        .cloned()
        .ok_or_else(|| Error::new(ErrorKind::UnknownApi(name.to_string())))
}
