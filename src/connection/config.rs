//! Connection configuration and endpoint selection

use crate::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Production gateway host
pub const PRODUCTION_HOST: &str = "gateway.push.apple.com";

/// Sandbox gateway host
pub const SANDBOX_HOST: &str = "gateway.sandbox.push.apple.com";

/// Gateway port, shared by both environments
pub const GATEWAY_PORT: u16 = 2195;

/// Gateway environment selected by the sandbox flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Live gateway
    #[default]
    Production,
    /// Development gateway
    Sandbox,
}

impl Environment {
    /// Fixed endpoint for this environment
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Production => Endpoint::new(PRODUCTION_HOST, GATEWAY_PORT),
            Self::Sandbox => Endpoint::new(SANDBOX_HOST, GATEWAY_PORT),
        }
    }

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gateway `(host, port)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname, also used for SNI and certificate name checks
    pub host: &'static str,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint
    pub const fn new(host: &'static str, port: u16) -> Self {
        Self { host, port }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Bound on how long a readiness check may block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeout {
    seconds: u64,
    microseconds: u64,
}

impl ReadTimeout {
    /// Seconds component, as configured
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Microseconds component, as configured
    pub fn microseconds(&self) -> u64 {
        self.microseconds
    }

    /// Total wait as a `Duration`
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.seconds).saturating_add(Duration::from_micros(self.microseconds))
    }
}

impl Default for ReadTimeout {
    fn default() -> Self {
        Self {
            seconds: 1,
            microseconds: 0,
        }
    }
}

/// Connection configuration
///
/// Setters validate eagerly and leave the configuration untouched on failure.
/// They return `&mut Self` so calls can be chained:
///
/// ```no_run
/// # fn example() -> pushgate::Result<()> {
/// use pushgate::ConnectionConfig;
///
/// let mut config = ConnectionConfig::new();
/// config
///     .set_certificate_file("/etc/push/bundle.pem")?
///     .set_certificate_passphrase("secret")
///     .set_sandbox_mode(true)
///     .set_read_timeout(0, 500_000)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    certificate_path: Option<PathBuf>,
    certificate_passphrase: Option<String>,
    sandbox_mode: bool,
    read_timeout: ReadTimeout,
    connect_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Create a configuration with defaults
    ///
    /// # Defaults
    ///
    /// - no certificate, no passphrase
    /// - production gateway
    /// - read timeout of 1s / 0µs
    /// - no connect timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client certificate bundle.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the path does not name a readable file.
    pub fn set_certificate_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        check_readable_file(path)?;
        self.certificate_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Set the passphrase for the certificate's private key.
    ///
    /// An empty passphrase means no passphrase.
    pub fn set_certificate_passphrase(&mut self, passphrase: impl Into<String>) -> &mut Self {
        let passphrase = passphrase.into();
        self.certificate_passphrase = if passphrase.is_empty() {
            None
        } else {
            Some(passphrase)
        };
        self
    }

    /// Select the sandbox (`true`) or production (`false`) gateway
    pub fn set_sandbox_mode(&mut self, sandbox: bool) -> &mut Self {
        self.sandbox_mode = sandbox;
        self
    }

    /// Set the readiness-check timeout.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if either component is negative.
    pub fn set_read_timeout(&mut self, seconds: i64, microseconds: i64) -> Result<&mut Self> {
        let seconds = u64::try_from(seconds).map_err(|_| {
            Error::Configuration(format!(
                "read timeout seconds must be a non-negative integer, got {}",
                seconds
            ))
        })?;
        let microseconds = u64::try_from(microseconds).map_err(|_| {
            Error::Configuration(format!(
                "read timeout microseconds must be a non-negative integer, got {}",
                microseconds
            ))
        })?;
        self.read_timeout = ReadTimeout {
            seconds,
            microseconds,
        };
        Ok(self)
    }

    /// Bound the combined TCP connect and TLS handshake.
    ///
    /// Default: None (wait for the OS to give up)
    pub fn set_connect_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Configured certificate bundle path
    pub fn certificate_path(&self) -> Option<&Path> {
        self.certificate_path.as_deref()
    }

    /// Configured passphrase
    pub fn certificate_passphrase(&self) -> Option<&str> {
        self.certificate_passphrase.as_deref()
    }

    /// Whether the sandbox gateway is selected
    pub fn sandbox_mode(&self) -> bool {
        self.sandbox_mode
    }

    /// Read timeout as `(seconds, microseconds)`, exactly as set
    pub fn read_timeout(&self) -> (u64, u64) {
        (self.read_timeout.seconds, self.read_timeout.microseconds)
    }

    /// Read timeout as a `Duration`
    pub fn read_timeout_duration(&self) -> Duration {
        self.read_timeout.as_duration()
    }

    /// Connect timeout, if any
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Environment selected by the sandbox flag
    pub fn environment(&self) -> Environment {
        if self.sandbox_mode {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }

    /// Gateway endpoint for the selected environment
    pub fn endpoint(&self) -> Endpoint {
        self.environment().endpoint()
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("certificate_path", &self.certificate_path)
            .field(
                "certificate_passphrase",
                &self.certificate_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("sandbox_mode", &self.sandbox_mode)
            .field("read_timeout", &self.read_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn check_readable_file(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| {
        Error::Configuration(format!(
            "certificate file '{}' is not readable: {}",
            path.display(),
            e
        ))
    })?;
    let metadata = file.metadata().map_err(|e| {
        Error::Configuration(format!(
            "certificate file '{}' is not readable: {}",
            path.display(),
            e
        ))
    })?;
    if !metadata.is_file() {
        return Err(Error::Configuration(format!(
            "certificate path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(())
}
