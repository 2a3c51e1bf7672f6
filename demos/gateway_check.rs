//! Connect to the push gateway, wait briefly for a reply, and disconnect.
//!
//! ```bash
//! PUSHGATE_CERT=/path/to/bundle.pem PUSHGATE_SANDBOX=true \
//!   RUST_LOG=pushgate=debug cargo run --example gateway_check
//! ```
//!
//! Environment:
//! * `PUSHGATE_CERT` - PEM bundle with client certificate and key (required)
//! * `PUSHGATE_PASSPHRASE` - passphrase for an encrypted key
//! * `PUSHGATE_SANDBOX` - `true` for the sandbox gateway

use pushgate::{ConnectionConfig, ManagedConnection};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pushgate=info")),
        )
        .init();

    let cert = env::var("PUSHGATE_CERT").map_err(|_| "PUSHGATE_CERT must be set")?;
    let sandbox = env::var("PUSHGATE_SANDBOX")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false);

    let mut config = ConnectionConfig::new();
    config
        .set_certificate_file(&cert)?
        .set_sandbox_mode(sandbox)
        .set_read_timeout(2, 0)?
        .set_connect_timeout(Duration::from_secs(10));
    if let Ok(passphrase) = env::var("PUSHGATE_PASSPHRASE") {
        config.set_certificate_passphrase(passphrase);
    }

    let mut conn = ManagedConnection::new(config);
    println!("connecting to {}", conn.endpoint());
    conn.connect().await?;
    println!("connected: {}", conn.is_connected());

    if conn.is_ready_to_read().await? {
        let data = conn.read(6).await?;
        println!("gateway sent {} bytes: {:02x?}", data.len(), &data[..]);
    } else {
        println!("no data from gateway");
    }

    conn.close().await;
    println!("closed");
    Ok(())
}
