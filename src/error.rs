//! Error types for the fireplace protocol.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for fireplace operations.
pub type Result<T> = std::result::Result<T, FireError>;

/// Errors that can occur while talking to a fireplace controller.
#[derive(Debug, Error)]
pub enum FireError {
    /// Caller-supplied value outside the protocol domain.
    ///
    /// Always detected before any network I/O.
    #[error("Invalid value for '{parameter}': {reason}")]
    Validation {
        /// Name of the rejected parameter.
        parameter: String,
        /// Description of why the value was rejected.
        reason: String,
    },

    /// No reply arrived within the configured window.
    #[error("No reply within {timeout_ms} ms")]
    Timeout {
        /// Length of the window that elapsed.
        timeout_ms: u64,
    },

    /// The fixed local port is owned by another socket.
    #[error("Local UDP port {port} is busy")]
    TransportBusy {
        /// The port that could not be bound.
        port: u16,
    },

    /// A request was issued while another one was still waiting for its reply.
    #[error("Another request is already waiting for a reply")]
    ConcurrentRequest,

    /// A datagram arrived but is not a well-formed reply frame.
    #[error("Malformed reply: {reason}")]
    MalformedReply {
        /// Description of the defect.
        reason: String,
    },

    /// Transport-level failure (bind, send or receive).
    #[error("Network error: {0}")]
    Network(#[from] io::Error),
}

impl FireError {
    /// Creates a new `Validation` error.
    ///
    /// # Example
    ///
    /// ```
    /// use escea_fire::FireError;
    ///
    /// let err = FireError::validation("celsius", "must be between 10 and 31");
    /// ```
    pub fn validation(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `Timeout` error for a window of the given length.
    pub fn timeout(window: Duration) -> Self {
        Self::Timeout {
            timeout_ms: window.as_millis() as u64,
        }
    }

    /// Creates a new `TransportBusy` error.
    pub fn transport_busy(port: u16) -> Self {
        Self::TransportBusy { port }
    }

    /// Creates a new `MalformedReply` error.
    ///
    /// # Example
    ///
    /// ```
    /// use escea_fire::FireError;
    ///
    /// let err = FireError::malformed_reply("expected 16 bytes, got 3");
    /// ```
    pub fn malformed_reply(reason: impl Into<String>) -> Self {
        Self::MalformedReply {
            reason: reason.into(),
        }
    }

    /// Returns `true` when the device should be treated as currently unreachable.
    ///
    /// Callers presenting state to a user keep the last known status on these
    /// errors instead of reporting a hard failure.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network(_))
    }

    /// Returns `true` if re-issuing the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Network(_)
                | Self::TransportBusy { .. }
                | Self::ConcurrentRequest
        )
    }
}
