//! Managed client-certificate TLS connection to a push notification gateway.
//!
//! `pushgate` owns the lifecycle of a single outbound TLS socket to the
//! gateway: certificate-based client authentication, production or sandbox
//! endpoint selection, combined TCP connect and TLS handshake, bounded
//! readiness checks, raw reads and writes, and orderly teardown.
//!
//! Payload framing, queueing and retry policy belong to the layers above.
//!
//! # Example
//!
//! ```no_run
//! # async fn example() -> pushgate::Result<()> {
//! use pushgate::{ConnectionConfig, ManagedConnection};
//!
//! let mut config = ConnectionConfig::new();
//! config
//!     .set_certificate_file("/etc/push/bundle.pem")?
//!     .set_certificate_passphrase("secret");
//!
//! let mut conn = ManagedConnection::new(config);
//! conn.connect().await?;
//! conn.write(b"frame").await?;
//! conn.close().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod metrics;

#[cfg(test)]
mod test_support;

pub use connection::{ConnectionConfig, ConnectionState, Endpoint, Environment, ManagedConnection};
pub use error::{Error, Result};
