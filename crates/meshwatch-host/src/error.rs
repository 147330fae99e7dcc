//! Error types for the host session
//!
//! Only genuinely fatal conditions surface here. Per the error taxonomy of
//! this core: an invalid listen address is recovered locally by falling back
//! to the documented default, classification has no error path at all, and
//! channel saturation is absorbed as a counted drop. What remains is startup
//! failure (binding the endpoint) and misuse of the session lifecycle.

use std::borrow::Cow;
use thiserror::Error;

/// Errors that can occur in host session operations
#[derive(Debug, Error)]
pub enum HostError {
    /// Failed to bind or operate the network endpoint
    #[error("Transport error: {0}")]
    Transport(Cow<'static, str>),

    /// Invalid configuration that has no documented fallback
    #[error("Invalid configuration: {0}")]
    InvalidConfig(Cow<'static, str>),

    /// Operation attempted in the wrong lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(Cow<'static, str>),

    /// Event channel send/receive failure
    #[error("Channel error: {0}")]
    Channel(Cow<'static, str>),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl HostError {
    /// Create a transport error with static context (zero allocation)
    #[must_use]
    pub const fn transport(context: &'static str) -> Self {
        HostError::Transport(Cow::Borrowed(context))
    }

    /// Create an invalid state error with static context (zero allocation)
    #[must_use]
    pub const fn invalid_state(context: &'static str) -> Self {
        HostError::InvalidState(Cow::Borrowed(context))
    }

    /// Create a channel error with static context (zero allocation)
    #[must_use]
    pub const fn channel(context: &'static str) -> Self {
        HostError::Channel(Cow::Borrowed(context))
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::Io(err.to_string())
    }
}

/// Result type for host session operations
pub type Result<T> = std::result::Result<T, HostError>;
