//! Error types for pushgate

use std::io;
use thiserror::Error;

/// Message used when a transport failure carries no usable diagnostic.
pub(crate) const GENERIC_SOCKET_MESSAGE: &str = "unable to establish TLS connection";

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration input, raised when the bad value is set
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `connect()` attempted without a client certificate
    #[error("no client certificate configured")]
    MissingCertificate,

    /// Handshake, transport or not-connected failure
    #[error("socket error: {message}")]
    Socket {
        /// Lowest-level system error code, 0 when none was reported
        code: i32,
        /// Human-readable diagnostic
        message: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a socket error from a code and message
    pub fn socket(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        Error::Socket {
            code,
            message: if message.is_empty() {
                GENERIC_SOCKET_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    /// Error for I/O attempted on a closed connection
    pub(crate) fn not_connected() -> Self {
        Error::socket(0, "not connected")
    }

    /// Classify a transport-level I/O failure.
    ///
    /// OS errors win, then any rustls diagnostic carried inside the error,
    /// then the error's own text.
    pub(crate) fn from_io(err: &io::Error) -> Self {
        if let Some(code) = err.raw_os_error() {
            return Error::socket(code, format!("{}: {}", code, os_error_text(err)));
        }

        if let Some(tls) = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            return Error::from_tls(tls);
        }

        Error::socket(0, err.to_string())
    }

    /// Classify a TLS engine failure (no system code available)
    pub(crate) fn from_tls(err: &rustls::Error) -> Self {
        Error::socket(0, err.to_string())
    }

    /// Numeric code for socket errors, 0 for every other kind
    pub fn code(&self) -> i32 {
        match self {
            Error::Socket { code, .. } => *code,
            _ => 0,
        }
    }

    /// Check if this is a configuration fault
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Check if this is a missing-certificate fault
    pub fn is_missing_certificate(&self) -> bool {
        matches!(self, Error::MissingCertificate)
    }

    /// Check if this is a socket fault
    pub fn is_socket(&self) -> bool {
        matches!(self, Error::Socket { .. })
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::from_io(&err)
    }
}

/// OS error description without the trailing "(os error N)" decoration
fn os_error_text(err: &io::Error) -> String {
    let text = err.to_string();
    match text.find(" (os error") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_error_combines_code_and_text() {
        let err = Error::from(io::Error::from_raw_os_error(111));
        match err {
            Error::Socket { code, message } => {
                assert_eq!(code, 111);
                assert!(message.starts_with("111: "));
                assert!(!message.contains("os error"));
            }
            other => panic!("expected socket error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_tls_error_uses_tls_diagnostic() {
        let io_err = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        let err = Error::from(io_err);
        assert_eq!(err.code(), 0);
        assert!(err.to_string().contains("invalid peer certificate"));
    }

    #[test]
    fn test_plain_io_error_keeps_text() {
        let err = Error::from(io::Error::new(io::ErrorKind::Other, "handshake eof"));
        assert_eq!(err.code(), 0);
        assert_eq!(err.to_string(), "socket error: handshake eof");
    }

    #[test]
    fn test_empty_message_falls_back_to_generic() {
        let err = Error::socket(0, "");
        assert_eq!(
            err.to_string(),
            format!("socket error: {}", GENERIC_SOCKET_MESSAGE)
        );
    }

    #[test]
    fn test_kind_predicates() {
        assert!(Error::Configuration("bad".into()).is_configuration());
        assert!(Error::MissingCertificate.is_missing_certificate());
        assert!(Error::not_connected().is_socket());
        assert_eq!(Error::MissingCertificate.code(), 0);
    }
}
