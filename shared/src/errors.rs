//! Shared error types for the news discovery client

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Unknown LLM provider: {input}")]
    UnknownProvider { input: String },

    #[error("Unknown discovery scope: {input}")]
    UnknownScope { input: String },

    #[error("Unknown source type: {input}")]
    UnknownSourceType { input: String },
}
