//! HTTP transport for the gateway client.
//!
//! [`HttpTransport`] wraps hyper_util's legacy pooled client behind a
//! rustls connector that accepts both `http://` and `https://` gateways,
//! with HTTP/1.1 and HTTP/2 negotiated via ALPN. The pool is the explicit
//! connection capability the client owns; cloning the transport shares the
//! pool.
//!
//! Every gateway request carries a single complete JSON object, so the
//! request body type is simply [`http_body_util::Full`].
//!
//! # Feature Flags
//!
//! TLS requires a crypto provider and a root store:
//!
//! - `tls` (default) - enables `tls-ring` + `tls-native-roots`
//! - `tls-ring` / `tls-aws-lc` - crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - root certificates
//!
//! A custom [`rustls::ClientConfig`] (mTLS, private roots, relaxed
//! verification for development) can always be supplied via
//! [`HttpTransportBuilder::tls_config`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::ClientConfig;
use tower_service::Service;

use crate::ClientError;

/// Request body type: every gateway request is one buffered JSON object.
pub type RequestBody = Full<Bytes>;

/// Type alias for the pooled hyper client.
type PooledClient = Client<HttpsConnector<HttpConnector>, RequestBody>;

/// Pooled HTTP transport over hyper_util's legacy client.
#[derive(Clone)]
pub struct HttpTransport {
    client: PooledClient,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a new transport builder.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Create a transport with default settings.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Send an HTTP request and receive a response.
    pub async fn request(
        &self,
        request: http::Request<RequestBody>,
    ) -> Result<http::Response<Incoming>, ClientError> {
        self.client
            .request(request)
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    /// Custom TLS configuration.
    tls_config: Option<ClientConfig>,
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
    /// HTTP/2 keep-alive interval.
    h2_keep_alive_interval: Option<Duration>,
    /// HTTP/2 keep-alive timeout.
    h2_keep_alive_timeout: Option<Duration>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransportBuilder {
    pub fn new() -> Self {
        Self {
            tls_config: None,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            h2_keep_alive_interval: None,
            h2_keep_alive_timeout: None,
        }
    }

    /// Set a custom TLS configuration (custom roots, mTLS, ...).
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Set the connection pool idle timeout.
    ///
    /// Idle connections older than this are closed and removed from the
    /// pool. Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Disable the connection pool idle timeout.
    pub fn pool_idle_timeout_none(mut self) -> Self {
        self.pool_idle_timeout = None;
        self
    }

    /// Set the maximum number of idle connections per host. Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Send HTTP/2 PING frames at this interval to keep long-lived watch
    /// connections alive and detect dead ones.
    pub fn h2_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.h2_keep_alive_interval = Some(interval);
        self
    }

    /// How long to wait for a PING response before considering the
    /// connection dead. Only effective with `h2_keep_alive_interval`.
    pub fn h2_keep_alive_timeout(mut self, timeout: Duration) -> Self {
        self.h2_keep_alive_timeout = Some(timeout);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport, ClientError> {
        let tls_config = match self.tls_config {
            Some(config) => config,
            None => default_tls_config().ok_or_else(|| {
                ClientError::Transport(
                    "no TLS configuration available: enable the `tls` feature, install a \
                     default rustls CryptoProvider, or pass one via tls_config()"
                        .into(),
                )
            })?,
        };

        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_all_versions()
            .build();

        let mut builder = Client::builder(TokioExecutor::new());

        // The pool timer is required for pool_idle_timeout to take effect.
        builder.pool_timer(TokioTimer::new());

        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        if let Some(interval) = self.h2_keep_alive_interval {
            builder.http2_keep_alive_interval(interval);
        }
        if let Some(timeout) = self.h2_keep_alive_timeout {
            builder.http2_keep_alive_timeout(timeout);
        }

        Ok(HttpTransport {
            client: builder.build(connector),
        })
    }
}

/// Build the default TLS configuration from the enabled features, or from
/// a process-global rustls provider when no provider feature is enabled.
#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
fn default_tls_config() -> Option<ClientConfig> {
    let builder = crypto_provider_builder()?;
    Some(
        builder
            .with_root_certificates(build_root_store())
            .with_no_client_auth(),
    )
}

#[cfg(not(any(feature = "tls-native-roots", feature = "tls-webpki-roots")))]
fn default_tls_config() -> Option<ClientConfig> {
    None
}

#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
fn crypto_provider_builder()
-> Option<rustls::ConfigBuilder<ClientConfig, rustls::WantsVerifier>> {
    #[cfg(feature = "tls-ring")]
    return Some({
        let provider = std::sync::Arc::new(rustls::crypto::ring::default_provider());
        ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("safe default protocol versions should be valid")
    });

    #[cfg(all(feature = "tls-aws-lc", not(feature = "tls-ring")))]
    return Some({
        let provider = std::sync::Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("safe default protocol versions should be valid")
    });

    #[cfg(not(any(feature = "tls-ring", feature = "tls-aws-lc")))]
    {
        rustls::crypto::CryptoProvider::get_default().map(|provider| {
            ClientConfig::builder_with_provider(provider.clone())
                .with_safe_default_protocol_versions()
                .expect("safe default protocol versions should be valid")
        })
    }
}

/// Build the root certificate store from the enabled features.
#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
fn build_root_store() -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();

    // Prefer native roots when both features are enabled.
    #[cfg(feature = "tls-native-roots")]
    {
        let native = rustls_native_certs::load_native_certs();
        #[cfg(feature = "tracing")]
        for error in &native.errors {
            tracing::warn!("failed to load a native root certificate: {error}");
        }
        for cert in native.certs {
            // Individual unparseable certs are skipped.
            let _ = roots.add(cert);
        }
    }

    #[cfg(all(feature = "tls-webpki-roots", not(feature = "tls-native-roots")))]
    {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    roots
}

impl Service<http::Request<RequestBody>> for HttpTransport {
    type Response = http::Response<Incoming>;
    type Error = ClientError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // hyper_util legacy::Client is always ready
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<RequestBody>) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            client
                .request(req)
                .await
                .map_err(|e| ClientError::Transport(format!("request failed: {e}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = HttpTransportBuilder::new();
        assert_eq!(builder.pool_max_idle_per_host, 32);
        assert!(builder.pool_idle_timeout.is_some());
        assert!(builder.tls_config.is_none());
    }

    #[test]
    fn builder_pool_settings() {
        let builder = HttpTransportBuilder::new()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(10);
        assert_eq!(builder.pool_idle_timeout, Some(Duration::from_secs(60)));
        assert_eq!(builder.pool_max_idle_per_host, 10);
    }

    #[test]
    fn builder_h2_settings() {
        let builder = HttpTransportBuilder::new()
            .h2_keep_alive_interval(Duration::from_secs(10))
            .h2_keep_alive_timeout(Duration::from_secs(5));
        assert_eq!(builder.h2_keep_alive_interval, Some(Duration::from_secs(10)));
        assert_eq!(builder.h2_keep_alive_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn build_transport() {
        assert!(HttpTransportBuilder::new().build().is_ok());
    }
}
