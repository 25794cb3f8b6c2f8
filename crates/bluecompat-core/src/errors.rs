//! Error types for capability dispatch
//!
//! Two families live here. [`BindError`] and [`InvokeError`] describe why a
//! hidden entry point could not be used; they are carried inside
//! [`crate::Outcome::Failed`] and never returned to callers of a capability.
//! [`CompatError`] and [`PlatformError`] are the errors a capability call can
//! actually return: caller-input validation failures and conditions the
//! platform itself defines as exceptional.

use thiserror::Error;

use crate::types::ApiLevel;

// ----------------------------------------------------------------------------
// Reflective Tier Errors
// ----------------------------------------------------------------------------

/// Why resolving a hidden method failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("Can't find the method: {method} in instance: {target}")]
    MethodNotFound { method: String, target: String },

    #[error("Lookup of method {method} on {target} failed: {reason}")]
    LookupFailed {
        method: String,
        target: String,
        reason: String,
    },
}

/// Why invoking a hidden method failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("Illegal argument: {reason}")]
    IllegalArgument { reason: String },

    #[error("Illegal access: {reason}")]
    IllegalAccess { reason: String },

    #[error("Target method raised: {message}")]
    TargetException { message: String },

    #[error("Unexpected return value: expected {expected}, got {actual}")]
    ReturnType { expected: &'static str, actual: String },

    #[error("Didn't bind to method: {method} on instance: {target}")]
    NotBound { method: String, target: String },
}

impl InvokeError {
    pub fn illegal_argument<T: Into<String>>(reason: T) -> Self {
        Self::IllegalArgument {
            reason: reason.into(),
        }
    }

    pub fn target_exception<T: Into<String>>(message: T) -> Self {
        Self::TargetException {
            message: message.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Platform Errors
// ----------------------------------------------------------------------------

/// Errors a stable platform entry point defines as part of its contract
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Platform error: {0}")]
    Other(String),
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Errors surfaced to callers of a capability
#[derive(Debug, Error)]
pub enum CompatError {
    #[error("Invalid Bluetooth address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid PIN: {reason}")]
    InvalidPin { reason: String },

    #[error("Capability {capability}: bracket minimum {next} does not follow {previous}")]
    UnorderedBrackets {
        capability: String,
        previous: ApiLevel,
        next: ApiLevel,
    },

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl CompatError {
    /// Create an invalid-address error
    pub fn invalid_address<A: Into<String>, R: Into<String>>(address: A, reason: R) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_pin<T: Into<String>>(reason: T) -> Self {
        Self::InvalidPin {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for CompatError {
    fn from(err: std::io::Error) -> Self {
        CompatError::Platform(PlatformError::Io(err))
    }
}

impl From<serde_json::Error> for CompatError {
    fn from(err: serde_json::Error) -> Self {
        CompatError::config_error(err.to_string())
    }
}

pub type Result<T> = core::result::Result<T, CompatError>;
