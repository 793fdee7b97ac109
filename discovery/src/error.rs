//! Discovery error types

use thiserror::Error;
use shared::DiscoveryScope;

use crate::types::Stage;

/// Result type for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Discovery error types
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid start configuration: {message}")]
    Validation { message: String },

    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    #[error("Failed to decode backend response: {message}")]
    Decode { message: String },

    #[error("Backend reported discovery failure: {message}")]
    BackendReported { message: String },

    #[error("A discovery run for {scope} is already in progress")]
    AlreadyRunning { scope: DiscoveryScope },

    #[error("Cannot {operation} while the run is {stage}")]
    InvalidStage { operation: &'static str, stage: Stage },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl DiscoveryError {
    pub fn validation(message: impl Into<String>) -> Self {
        DiscoveryError::Validation { message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        DiscoveryError::Transport { status: None, message: message.into() }
    }

    /// Failures a polling loop may swallow and retry on the next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, DiscoveryError::Transport { .. } | DiscoveryError::Decode { .. })
    }

    /// Text shown to the user next to the confirm form
    pub fn user_message(&self) -> String {
        match self {
            DiscoveryError::Transport { message, .. }
            | DiscoveryError::BackendReported { message }
            | DiscoveryError::Validation { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DiscoveryError::Decode { message: err.to_string() }
        } else {
            DiscoveryError::Transport {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}
