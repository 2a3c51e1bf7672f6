//! Connection management
//!
//! This module handles:
//! * Configuration and gateway endpoint selection
//! * Client identity loading and TLS context construction
//! * Connection lifecycle (connect, I/O, close)
//! * State machine enforcement

mod config;
mod conn;
mod state;
mod tls;
mod transport;

pub use config::{
    ConnectionConfig, Endpoint, Environment, ReadTimeout, GATEWAY_PORT, PRODUCTION_HOST,
    SANDBOX_HOST,
};
pub use conn::ManagedConnection;
pub use state::ConnectionState;
pub use tls::{build_client_config, parse_server_name, platform_roots, ClientIdentity};
