//! TLS transport over TCP

use super::config::Endpoint;
use super::tls::parse_server_name;
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use futures::FutureExt;
use rustls::ClientConfig;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

/// A handshake-completed TLS session with the gateway.
///
/// Bytes pulled off the socket by a readiness check are kept in `pending`
/// until a read hands them out.
pub struct Transport {
    stream: TlsStream<TcpStream>,
    pending: BytesMut,
    eof: bool,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("stream", &"TlsStream<TcpStream>")
            .field("pending", &self.pending.len())
            .field("eof", &self.eof)
            .finish()
    }
}

impl Transport {
    /// Open a TCP connection to `endpoint` and complete the TLS handshake.
    ///
    /// Either both steps succeed or the socket is dropped before returning.
    pub async fn connect(endpoint: Endpoint, client_config: Arc<ClientConfig>) -> Result<Self> {
        let server_name = parse_server_name(endpoint.host)?;

        let tcp_stream = TcpStream::connect((endpoint.host, endpoint.port)).await?;
        if let Err(e) = tcp_stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }

        let connector = TlsConnector::from(client_config);
        let stream = connector.connect(server_name, tcp_stream).await?;

        Ok(Self {
            stream,
            pending: BytesMut::with_capacity(8192),
            eof: false,
        })
    }

    /// Single write attempt; returns how many bytes the session accepted.
    ///
    /// Never waits for the socket. Returns 0 when the session's send buffer
    /// is full. Records the socket cannot take yet stay queued and go out on
    /// the next write or on close.
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let accepted = match self.stream.write(buf).now_or_never() {
            Some(result) => result?,
            None => 0,
        };
        self.push_queued_records()?;
        Ok(accepted)
    }

    /// Hand queued TLS records to the socket without waiting for writability
    fn push_queued_records(&mut self) -> Result<()> {
        let (tcp, session) = self.stream.get_mut();
        let mut sink = NonBlockingSink(tcp);
        while session.wants_write() {
            match session.write_tls(&mut sink) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Up to `max` bytes that are available without waiting
    pub fn read_available(&mut self, max: usize) -> Result<Bytes> {
        if self.pending.is_empty() && !self.eof {
            // Poll the session once; a pending read means nothing is buffered.
            match self.stream.read_buf(&mut self.pending).now_or_never() {
                Some(Ok(0)) => self.eof = true,
                Some(Ok(_)) | None => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }

        let n = max.min(self.pending.len());
        Ok(self.pending.split_to(n).freeze())
    }

    /// Wait at most `timeout` for readable data.
    ///
    /// End of stream counts as readable.
    pub async fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        if !self.pending.is_empty() || self.eof {
            return Ok(true);
        }

        match tokio::time::timeout(timeout, self.stream.read_buf(&mut self.pending)).await {
            Ok(Ok(0)) => {
                self.eof = true;
                Ok(true)
            }
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(e.into()),
            Err(_elapsed) => Ok(false),
        }
    }

    /// Send close_notify and shut down the write half.
    ///
    /// Gives up after `limit`; the caller then drops the socket.
    pub async fn shutdown(&mut self, limit: Duration) -> Result<()> {
        match tokio::time::timeout(limit, self.stream.shutdown()).await {
            Ok(result) => Ok(result?),
            Err(_elapsed) => Err(Error::socket(
                0,
                format!("TLS shutdown did not finish within {:?}", limit),
            )),
        }
    }

    /// Queue close_notify without waiting, then release the socket.
    ///
    /// Used where no async context is available (drop).
    pub fn abort(mut self) {
        let (tcp, session) = self.stream.get_mut();
        session.send_close_notify();

        let mut sink = NonBlockingSink(tcp);
        while session.wants_write() {
            match session.write_tls(&mut sink) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }
}

/// `io::Write` over a tokio socket that never waits for writability
struct NonBlockingSink<'a>(&'a TcpStream);

impl io::Write for NonBlockingSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.try_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_connect_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let roots = rustls::RootCertStore::empty();
        let config = Arc::new(
            ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth(),
        );

        let err = Transport::connect(Endpoint::new("127.0.0.1", port), config)
            .await
            .unwrap_err();
        assert!(err.is_socket());
        assert_ne!(err.code(), 0);
        assert!(err.to_string().contains(&format!("{}: ", err.code())));
    }
}
