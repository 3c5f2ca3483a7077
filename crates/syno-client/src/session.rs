//! Login state shared by every handle of a client.
//!
//! The session only moves from unauthenticated to authenticated. The cookie
//! itself lives in the HTTP client's cookie store; this type tracks whether
//! the login already happened so it runs exactly once.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::error::Result;

/// One-time authentication gate.
#[derive(Debug, Default)]
pub struct Session {
    authorized: AtomicBool,
    lock: Mutex<()>,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once a login succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.authorized.load(Ordering::Acquire)
    }

    /// Run `login` unless a previous call already succeeded.
    ///
    /// Concurrent callers wait for the single in-flight login. A failed login
    /// leaves the session unauthenticated.
    pub async fn ensure_authenticated<F, Fut>(&self, login: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.is_authenticated() {
            return Ok(());
        }

        let _guard = self.lock.lock().await;
        if self.is_authenticated() {
            return Ok(());
        }

        login().await?;
        self.authorized.store(true, Ordering::Release);
        Ok(())
    }
}
