//! Error types for the crafting gateway
//!
//! Every operation failure reaches the caller as a [`Rejection`] whose
//! `Display` is exactly the message the HUD shows. The structured
//! [`RejectionCause`] travels alongside it for logs and metrics only.

use crate::model::VoxState;
use std::fmt;
use thiserror::Error;

// =============================================================================
// REJECTION
// =============================================================================

/// User-facing failure of a gateway operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Rejection {
    message: String,
    cause: RejectionCause,
}

impl Rejection {
    pub fn new(message: impl Into<String>, cause: RejectionCause) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    /// The text shown to the player.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &RejectionCause {
        &self.cause
    }

    pub fn into_message(self) -> String {
        self.message
    }

    /// True for faults in the client itself rather than the service.
    pub fn is_internal(&self) -> bool {
        matches!(self.cause, RejectionCause::RegistryMiss(_))
    }
}

// =============================================================================
// REJECTION CAUSE
// =============================================================================

/// Why an operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionCause {
    /// The transport could not complete the exchange.
    Transport(String),
    /// The expected field was present but did not decode.
    Malformed(String),
    /// The expected field was absent or null.
    MissingField(String),
    /// The vox reported a state other than `Found`.
    State(VoxState),
    /// No query body registered under this key.
    RegistryMiss(String),
}

impl RejectionCause {
    /// Stable label used for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            RejectionCause::Transport(_) => "transport",
            RejectionCause::Malformed(_) => "malformed",
            RejectionCause::MissingField(_) => "missing_field",
            RejectionCause::State(_) => "state",
            RejectionCause::RegistryMiss(_) => "registry_miss",
        }
    }
}

impl fmt::Display for RejectionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionCause::Transport(detail) => write!(f, "transport failure: {detail}"),
            RejectionCause::Malformed(detail) => write!(f, "malformed response: {detail}"),
            RejectionCause::MissingField(field) => write!(f, "response field {field} missing"),
            RejectionCause::State(state) => write!(f, "vox state {state}"),
            RejectionCause::RegistryMiss(key) => write!(f, "query {key} is not registered"),
        }
    }
}

// =============================================================================
// GATEWAY ERROR
// =============================================================================

/// Faults detected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("unsupported recipe category '{0}'")]
    UnsupportedCategory(String),

    #[error("query {0} is not registered")]
    RegistryMiss(String),
}
