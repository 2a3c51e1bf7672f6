//! Metric names and label values

/// Connection attempts, labeled by environment
pub const CONNECT_ATTEMPTS: &str = "pushgate_connect_attempts_total";
/// Successful connections, labeled by environment
pub const CONNECT_SUCCESS: &str = "pushgate_connect_success_total";
/// Failed connections, labeled by environment and reason
pub const CONNECT_FAILURES: &str = "pushgate_connect_failures_total";
/// Bytes accepted by the transport
pub const BYTES_WRITTEN: &str = "pushgate_bytes_written_total";
/// Bytes handed to callers
pub const BYTES_READ: &str = "pushgate_bytes_read_total";
/// Connections released, explicitly or on drop
pub const CONNECTIONS_CLOSED: &str = "pushgate_connections_closed_total";
/// Time spent in TCP connect plus TLS handshake
pub const HANDSHAKE_DURATION: &str = "pushgate_handshake_duration_seconds";

pub const ENVIRONMENT: &str = "environment";
pub const REASON: &str = "reason";

pub const REASON_MISSING_CERTIFICATE: &str = "missing_certificate";
pub const REASON_TLS_CONTEXT: &str = "tls_context";
pub const REASON_TRANSPORT: &str = "transport";
pub const REASON_TIMEOUT: &str = "timeout";
