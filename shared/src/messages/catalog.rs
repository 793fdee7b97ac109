//! Catalog listings read before a run starts

use serde::{Deserialize, Serialize};

/// One LLM provider as advertised by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "is_available")]
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderDescriptor>,
    pub default: String,
}

impl ProvidersResponse {
    pub fn available(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter().filter(|p| p.available)
    }
}
