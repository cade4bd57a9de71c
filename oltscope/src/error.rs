//! Error types for oltscope.

use std::io;
use thiserror::Error;

/// Main error type for oltscope operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Byte-stream transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Login, escalation and context navigation errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Invalid device or dialect configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The device could not be reached or logged into.
    ///
    /// This is the only error a lookup returns; the pooled session has
    /// already been discarded when it is produced.
    #[error("Device '{device}' unreachable: {source}")]
    DeviceUnreachable {
        device: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error as a `DeviceUnreachable` for the named device.
    ///
    /// Already-wrapped errors are returned unchanged.
    pub fn unreachable(device: impl Into<String>, source: Error) -> Self {
        match source {
            err @ Error::DeviceUnreachable { .. } => err,
            other => Error::DeviceUnreachable {
                device: device.into(),
                source: Box::new(other),
            },
        }
    }

    /// Check if this error means the device was unreachable.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::DeviceUnreachable { .. })
    }
}

/// Transport layer errors (TCP connection, socket I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session-level errors (authentication state machine, context navigation).
#[derive(Error, Debug)]
pub enum SessionError {
    /// An expected prompt never showed up while logging in
    #[error("Authentication failed for user '{user}': no {stage} observed")]
    Authentication { user: String, stage: LoginStage },

    /// Could not enter or leave an interface context
    #[error("Context navigation failed for port '{port}': {reason}")]
    ContextNavigation { port: String, reason: String },

    /// A command's reply never ended with a prompt, so later output can no
    /// longer be attributed to the command that produced it
    #[error("No prompt after '{command}', session out of sync")]
    OutOfSync { command: String },

    /// Commands were issued on a session that never finished logging in
    #[error("Session is not authenticated")]
    NotAuthenticated,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required field was missing or empty
    #[error("Invalid device configuration: {message}")]
    InvalidDevice { message: String },

    /// Invalid regex pattern in a dialect definition
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// The login step whose expected prompt was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    LoginPrompt,
    PasswordPrompt,
    UserPrompt,
    EnablePasswordPrompt,
    PrivilegedPrompt,
    Pagination,
}

impl std::fmt::Display for LoginStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoginStage::LoginPrompt => "login prompt",
            LoginStage::PasswordPrompt => "password prompt",
            LoginStage::UserPrompt => "user prompt",
            LoginStage::EnablePasswordPrompt => "enable password prompt",
            LoginStage::PrivilegedPrompt => "privileged prompt",
            LoginStage::Pagination => "prompt after disabling pagination",
        };
        f.write_str(name)
    }
}

/// Result type alias using oltscope's Error.
pub type Result<T> = std::result::Result<T, Error>;
