//! Client configuration.

use std::time::Duration;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Skip TLS certificate verification (self-signed appliances).
    pub accept_invalid_certs: bool,
    /// Whether to enable request/response tracing.
    pub enable_tracing: bool,
    /// Size of the chunks the multipart producer reads from attachments.
    pub stream_chunk_size: usize,
    /// Number of chunks buffered between the multipart producer and the HTTP body.
    pub stream_buffer_chunks: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            accept_invalid_certs: false,
            enable_tracing: true,
            stream_chunk_size: 64 * 1024,
            stream_buffer_chunks: 4,
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Disable TLS certificate verification.
    pub fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.config.accept_invalid_certs = insecure;
        self
    }

    /// Enable or disable request/response tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Set the multipart read chunk size (minimum 1 byte).
    pub fn with_stream_chunk_size(mut self, size: usize) -> Self {
        self.config.stream_chunk_size = size.max(1);
        self
    }

    /// Set how many chunks may be in flight between producer and HTTP body (minimum 1).
    pub fn with_stream_buffer_chunks(mut self, chunks: usize) -> Self {
        self.config.stream_buffer_chunks = chunks.max(1);
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
