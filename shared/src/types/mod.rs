//! Core types used throughout the discovery client

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SharedError;

/// LLM backends the dashboard can run discovery with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Let the backend pick from its configured fallback chain
    #[default]
    Auto,
    Grok,
    Anthropic,
    OpenAI,
    Gemini,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 5] = [
        LlmProvider::Auto,
        LlmProvider::Grok,
        LlmProvider::Anthropic,
        LlmProvider::OpenAI,
        LlmProvider::Gemini,
    ];

    /// Wire identifier sent to the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Auto => "auto",
            LlmProvider::Grok => "grok",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(LlmProvider::Auto),
            "grok" | "xai" => Ok(LlmProvider::Grok),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "openai" | "gpt" => Ok(LlmProvider::OpenAI),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            _ => Err(SharedError::UnknownProvider { input: s.to_string() }),
        }
    }
}

/// Backend job family a discovery run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryScope {
    /// Search across configured news resources (websites)
    Resources,
    /// Search by manufacturers
    Manufacturers,
}

impl DiscoveryScope {
    /// Resource discovery cannot start without a search configuration
    pub fn requires_search_config(&self) -> bool {
        matches!(self, DiscoveryScope::Resources)
    }
}

impl fmt::Display for DiscoveryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryScope::Resources => write!(f, "resources"),
            DiscoveryScope::Manufacturers => write!(f, "manufacturers"),
        }
    }
}

impl std::str::FromStr for DiscoveryScope {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resources" | "resource" => Ok(DiscoveryScope::Resources),
            "manufacturers" | "manufacturer" => Ok(DiscoveryScope::Manufacturers),
            _ => Err(SharedError::UnknownScope { input: s.to_string() }),
        }
    }
}

/// How a resource's news are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Auto,
    Hybrid,
    /// Curated by hand, never searched automatically
    Manual,
    #[serde(other)]
    Other,
}

impl std::str::FromStr for SourceType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(SourceType::Auto),
            "hybrid" => Ok(SourceType::Hybrid),
            "manual" => Ok(SourceType::Manual),
            _ => Err(SharedError::UnknownSourceType { input: s.to_string() }),
        }
    }
}

/// A resource or manufacturer that discovery can be requested for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetItem {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub source_type: Option<SourceType>,
}

impl TargetItem {
    pub fn new(id: u64, name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            id,
            name: name.into(),
            source_type: Some(source_type),
        }
    }

    /// Only automatic and hybrid sources take part in automated discovery
    pub fn is_eligible(&self) -> bool {
        matches!(self.source_type, Some(SourceType::Auto | SourceType::Hybrid))
    }
}
