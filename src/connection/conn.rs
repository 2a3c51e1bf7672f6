//! Core connection type

use super::config::{ConnectionConfig, Endpoint};
use super::state::ConnectionState;
use super::tls::{self, ClientIdentity};
use super::transport::Transport;
use crate::metrics::{counters, histograms, labels};
use crate::{Error, Result};
use bytes::Bytes;
use rustls::RootCertStore;
use std::time::Instant;
use tracing::Instrument;

/// Client-certificate TLS connection to the push gateway.
///
/// Owns at most one socket. The socket is released by [`close`](Self::close)
/// or, failing that, when the connection is dropped. Methods take `&mut self`;
/// share a connection across tasks behind a mutex.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> pushgate::Result<()> {
/// use pushgate::{ConnectionConfig, ManagedConnection};
///
/// let mut config = ConnectionConfig::new();
/// config.set_certificate_file("/etc/push/bundle.pem")?.set_sandbox_mode(true);
///
/// let mut conn = ManagedConnection::new(config);
/// conn.connect().await?;
///
/// let frame = b"\x00payload";
/// let mut sent = 0;
/// while sent < frame.len() {
///     sent += conn.write(&frame[sent..]).await?;
/// }
///
/// if conn.is_ready_to_read().await? {
///     let reply = conn.read(6).await?;
///     println!("gateway replied with {} bytes", reply.len());
/// }
/// conn.close().await;
/// # Ok(())
/// # }
/// ```
pub struct ManagedConnection {
    config: ConnectionConfig,
    transport: Option<Transport>,
    state: ConnectionState,
}

impl ManagedConnection {
    /// Create a closed connection
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            transport: None,
            state: ConnectionState::Closed,
        }
    }

    /// Configuration this connection was built with
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Gateway endpoint selected by the configuration
    pub fn endpoint(&self) -> Endpoint {
        self.config.endpoint()
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a socket is currently held
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Connect to the configured gateway and complete the TLS handshake.
    ///
    /// A no-op when already connected.
    ///
    /// # Errors
    ///
    /// - `Error::MissingCertificate` if no certificate file is configured
    /// - `Error::Socket` for any failure while building the TLS context,
    ///   connecting, or handshaking
    pub async fn connect(&mut self) -> Result<()> {
        let endpoint = self.config.endpoint();
        self.establish(endpoint, None).await
    }

    /// Connect to an explicit endpoint trusting only `roots`.
    #[cfg(test)]
    pub(crate) async fn connect_to(
        &mut self,
        endpoint: Endpoint,
        roots: RootCertStore,
    ) -> Result<()> {
        self.establish(endpoint, Some(roots)).await
    }

    async fn establish(&mut self, endpoint: Endpoint, roots: Option<RootCertStore>) -> Result<()> {
        if self.is_connected() {
            tracing::debug!("already connected, skipping handshake");
            return Ok(());
        }

        let environment = self.config.environment();
        let span = tracing::info_span!(
            "connect",
            host = endpoint.host,
            port = endpoint.port,
            environment = %environment
        );

        async move {
            counters::connect_attempted(environment);

            let Some(path) = self.config.certificate_path().map(|p| p.to_path_buf()) else {
                counters::connect_failed(environment, labels::REASON_MISSING_CERTIFICATE);
                return Err(Error::MissingCertificate);
            };

            let client_config =
                ClientIdentity::from_pem_file(&path, self.config.certificate_passphrase())
                    .and_then(|identity| {
                        tls::build_client_config(
                            identity,
                            roots.unwrap_or_else(tls::platform_roots),
                        )
                    })
                    .map_err(|e| {
                        tracing::warn!(error = %e, "failed to build TLS client context");
                        counters::connect_failed(environment, labels::REASON_TLS_CONTEXT);
                        e
                    })?;

            let started = Instant::now();
            let attempt = Transport::connect(endpoint, client_config);
            let result = match self.config.connect_timeout() {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        tracing::warn!(timeout = ?limit, "connect timed out");
                        counters::connect_failed(environment, labels::REASON_TIMEOUT);
                        return Err(Error::socket(
                            0,
                            format!("connection to {} timed out after {:?}", endpoint, limit),
                        ));
                    }
                },
                None => attempt.await,
            };

            let transport = result.map_err(|e| {
                tracing::warn!(error = %e, "TLS connection failed");
                counters::connect_failed(environment, labels::REASON_TRANSPORT);
                e
            })?;
            histograms::handshake_duration(environment, started.elapsed());

            self.state.transition(ConnectionState::Open)?;
            self.transport = Some(transport);
            counters::connect_succeeded(environment);
            tracing::info!("TLS connection established");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Write once to the gateway.
    ///
    /// Returns how many bytes were accepted, which may be fewer than
    /// `data.len()`; callers resend the remainder.
    ///
    /// # Errors
    ///
    /// `Error::Socket` if not connected or the transport fails.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let transport = self.transport.as_mut().ok_or_else(Error::not_connected)?;
        let n = transport.write(data).await?;
        counters::bytes_written(n);
        Ok(n)
    }

    /// Up to `length` bytes that have already arrived.
    ///
    /// Never waits for more data; an empty result means nothing is buffered.
    /// Use [`is_ready_to_read`](Self::is_ready_to_read) to wait.
    ///
    /// # Errors
    ///
    /// `Error::Socket` if not connected or the transport fails.
    pub async fn read(&mut self, length: usize) -> Result<Bytes> {
        let transport = self.transport.as_mut().ok_or_else(Error::not_connected)?;
        let data = transport.read_available(length)?;
        counters::bytes_read(data.len());
        Ok(data)
    }

    /// Wait up to the configured read timeout for data to arrive.
    ///
    /// # Errors
    ///
    /// `Error::Socket` if not connected or the transport fails.
    pub async fn is_ready_to_read(&mut self) -> Result<bool> {
        let timeout = self.config.read_timeout_duration();
        let transport = self.transport.as_mut().ok_or_else(Error::not_connected)?;
        transport.wait_readable(timeout).await
    }

    /// Shut down the TLS session and release the socket.
    ///
    /// The shutdown waits at most the configured read timeout. Shutdown
    /// failures are logged and otherwise ignored. Closing a closed
    /// connection does nothing.
    pub async fn close(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };

        let limit = self.config.read_timeout_duration();
        if let Err(e) = transport.shutdown(limit).await {
            tracing::debug!(error = %e, "TLS shutdown failed, releasing socket");
        }
        drop(transport);

        let _ = self.state.transition(ConnectionState::Closed);
        counters::connection_closed();
        tracing::info!(endpoint = %self.config.endpoint(), "connection closed");
    }
}

impl Drop for ManagedConnection {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.take() {
            tracing::debug!("connection dropped while open, closing");
            transport.abort();
            counters::connection_closed();
        }
    }
}

impl std::fmt::Debug for ManagedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedConnection")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("transport", &self.transport)
            .finish()
    }
}
