//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`GatewayClient`].

use std::time::Duration;

use crate::ClientError;
use crate::client::GatewayClient;
use crate::transport::HttpTransport;

/// Builder for creating a [`GatewayClient`].
///
/// # Example
///
/// ```ignore
/// use etcd_gateway_client::ClientBuilder;
/// use std::time::Duration;
///
/// let client = ClientBuilder::new("http://127.0.0.1:2379")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    /// Base URL of the gateway (e.g. "http://127.0.0.1:2379").
    base_url: String,
    /// Optional pre-configured transport.
    transport: Option<HttpTransport>,
    /// Default timeout for the request phase of each call.
    default_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Create a new builder with the given base URL.
    ///
    /// The base URL carries the scheme and authority; a trailing slash is
    /// removed.
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            transport: None,
            default_timeout: None,
        }
    }

    /// Use a pre-configured transport (custom TLS, pool tuning).
    ///
    /// # Example
    ///
    /// ```ignore
    /// use etcd_gateway_client::{ClientBuilder, HttpTransport};
    /// use std::time::Duration;
    ///
    /// let transport = HttpTransport::builder()
    ///     .pool_idle_timeout(Duration::from_secs(60))
    ///     .build()?;
    ///
    /// let client = ClientBuilder::new("https://etcd.internal:2379")
    ///     .transport(transport)
    ///     .build()?;
    /// ```
    pub fn transport(mut self, transport: HttpTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set a default timeout for the request phase of each call.
    ///
    /// The timeout covers sending the request and receiving the response
    /// head (and, for unary calls, the body). It deliberately does not
    /// bound how long an established watch stream stays open.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// Builds a default [`HttpTransport`] unless one was supplied.
    pub fn build(self) -> Result<GatewayClient, ClientError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => HttpTransport::new()?,
        };
        let base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(GatewayClient::new(transport, base_url, self.default_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_with_defaults() {
        let client = ClientBuilder::new("http://127.0.0.1:2379").build().unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:2379");
    }

    #[test]
    fn build_with_custom_transport() {
        let transport = HttpTransport::new().unwrap();
        let result = ClientBuilder::new("http://127.0.0.1:2379")
            .transport(transport)
            .timeout(Duration::from_secs(5))
            .build();
        assert!(result.is_ok());
    }
}
