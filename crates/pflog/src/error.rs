//! Error types for pflog operations.

use std::io;

use crate::interface::ControlRequest;

/// Result type for pflog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing or feeding logging interfaces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller passed an empty packet, no matched rule, or no source interface.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// No live interface with this unit.
    #[error("interface not found: unit {unit}")]
    NotFound {
        /// The unit that was looked up.
        unit: u32,
    },

    /// Injection without a target unit while the registry is empty.
    #[error("no logging interface available")]
    NoDefaultInterface,

    /// A live interface already uses this unit.
    #[error("interface already exists: {name}")]
    AlreadyExists {
        /// The derived interface name.
        name: String,
    },

    /// Control request the interface does not handle.
    #[error("operation not supported: {0}")]
    UnsupportedOperation(ControlRequest),

    /// Creation could not be satisfied.
    #[error("cannot create interface: {0}")]
    ResourceExhausted(String),

    /// Not enough bytes to decode a header.
    #[error("record truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum length required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Header bytes are present but inconsistent.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoDefaultInterface)
    }

    /// Check if this is a caller contract violation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a "already exists" error.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Short stable name of the error class, for operator output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::NotFound { .. } | Self::NoDefaultInterface => "NotFound",
            Self::AlreadyExists { .. } => "AlreadyExists",
            Self::UnsupportedOperation(_) => "UnsupportedOperation",
            Self::ResourceExhausted(_) => "ResourceExhausted",
            Self::Truncated { .. } | Self::InvalidHeader(_) => "InvalidHeader",
            Self::Config(_) => "Config",
            Self::Io(_) => "Io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound { unit: 3 }.is_not_found());
        assert!(Error::NoDefaultInterface.is_not_found());
        assert!(!Error::InvalidArgument("empty packet").is_not_found());
    }

    #[test]
    fn test_kind() {
        assert_eq!(Error::NoDefaultInterface.kind(), "NotFound");
        assert_eq!(
            Error::UnsupportedOperation(ControlRequest::SetMtu(1500)).kind(),
            "UnsupportedOperation"
        );
        assert_eq!(
            Error::ResourceExhausted("unit limit".into()).kind(),
            "ResourceExhausted"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = Error::NotFound { unit: 7 };
        assert_eq!(err.to_string(), "interface not found: unit 7");

        let err = Error::AlreadyExists {
            name: "pflog0".into(),
        };
        assert_eq!(err.to_string(), "interface already exists: pflog0");

        let err = Error::Truncated {
            expected: 48,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "record truncated: expected 48 bytes, got 10"
        );
    }
}
