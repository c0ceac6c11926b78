use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type ConnectResult<T> = Result<T, ConnectError>;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("nix errno: {0}")]
    Nix(#[from] nix::errno::Errno),

    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// Failure reported by the external install procedure.
///
/// The message is shown to the operator verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InstallError {
    pub message: String,
}

impl InstallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<HalError> for InstallError {
    fn from(err: HalError) -> Self {
        Self::new(err.to_string())
    }
}

/// Coarse classification used by callers that need to tell bad input apart
/// from an operation that is not allowed in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Configuration can only be updated once")]
    AlreadyConfigured,

    #[error("TrueNAS Connect needs to be enabled first")]
    NotEnabled,

    #[error("Cannot specify interfaces when use_all_interfaces is true")]
    AmbiguousInterfaces,

    #[error("No IP addresses available. Provide IPs, interfaces, or enable use_all_interfaces")]
    NoAddresses,

    #[error("{0}")]
    InvalidInterface(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Address discovery failed: {0}")]
    Discovery(String),

    #[error("Failed to persist connect configuration: {0}")]
    Cache(String),
}

impl ConnectError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ConnectError::AlreadyConfigured | ConnectError::NotEnabled => ErrorClass::Conflict,
            ConnectError::AmbiguousInterfaces
            | ConnectError::NoAddresses
            | ConnectError::InvalidInterface(_)
            | ConnectError::ValidationFailed(_) => ErrorClass::Validation,
            ConnectError::Discovery(_) | ConnectError::Cache(_) => ErrorClass::Internal,
        }
    }

    /// Stable numeric code reported on the wire.
    pub fn errno(&self) -> Errno {
        match self.class() {
            ErrorClass::Validation => Errno::EINVAL,
            ErrorClass::Conflict => Errno::EBUSY,
            ErrorClass::Internal => Errno::EIO,
        }
    }
}

/// Error object carried in API responses.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

impl ApiError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(Self::PARSE_ERROR, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Errno::EINVAL as i32, message)
    }
}

impl From<ConnectError> for ApiError {
    fn from(err: ConnectError) -> Self {
        Self::new(err.errno() as i32, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_and_validation_have_distinct_codes() {
        assert_eq!(ConnectError::AlreadyConfigured.errno(), Errno::EBUSY);
        assert_eq!(ConnectError::NotEnabled.errno(), Errno::EBUSY);
        assert_eq!(ConnectError::NoAddresses.errno(), Errno::EINVAL);
        assert_eq!(
            ConnectError::InvalidInterface("eth9".into()).class(),
            ErrorClass::Validation
        );
    }

    #[test]
    fn api_error_keeps_connect_message() {
        let err = ApiError::from(ConnectError::AlreadyConfigured);
        assert_eq!(err.code, Errno::EBUSY as i32);
        assert_eq!(err.message, "Configuration can only be updated once");
    }

    #[test]
    fn install_error_from_hal_error_is_readable() {
        let err = InstallError::from(HalError::CommandNotFound("truenas-install".into()));
        assert_eq!(err.message, "Command not found: truenas-install");
    }
}
