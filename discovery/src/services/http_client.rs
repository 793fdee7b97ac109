//! HTTP implementation of the dashboard backend API

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use shared::{
    DiscoveryInfo, DiscoveryScope, DiscoveryStatusPayload, DraftItem, LlmProvider,
    ProvidersResponse, SingleItemResponse, TargetItem,
};
use crate::config::ApiConfig;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::traits::DiscoveryApi;
use crate::types::StartConfig;

/// Admin endpoints of one discovery scope
struct ScopeEndpoints {
    info: &'static str,
    start: &'static str,
    status: &'static str,
}

fn endpoints(scope: DiscoveryScope) -> ScopeEndpoints {
    match scope {
        DiscoveryScope::Resources => ScopeEndpoints {
            info: "admin/references/newsresource/discover-news-info/",
            start: "admin/references/newsresource/discover-news/",
            status: "admin/references/newsresource/discover-news-status/",
        },
        DiscoveryScope::Manufacturers => ScopeEndpoints {
            info: "admin/references/manufacturer/discover-manufacturers-info/",
            start: "admin/references/manufacturer/discover-manufacturers-news/",
            status: "admin/references/manufacturer/discover-manufacturers-status/",
        },
    }
}

/// List endpoints answer either with a page object or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Page { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page { results } => results,
            Listing::Plain(items) => items,
        }
    }
}

struct ClientState {
    config: ApiConfig,
    http: Client,
}

/// reqwest-backed `DiscoveryApi`
pub struct RealDiscoveryApi {
    state: RwLock<ClientState>,
}

impl RealDiscoveryApi {
    pub fn new(config: ApiConfig) -> DiscoveryResult<Self> {
        let http = build_client(&config)?;
        Ok(Self {
            state: RwLock::new(ClientState { config, http }),
        })
    }

    /// Build from `.env` and the process environment
    pub fn from_env() -> DiscoveryResult<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    /// Swap base URL, token or language for all subsequent requests
    pub async fn reconfigure(&self, config: ApiConfig) -> DiscoveryResult<()> {
        let http = build_client(&config)?;
        let mut state = self.state.write().await;
        info!(base_url = %config.base_url, "Reconfigured discovery API client");
        *state = ClientState { config, http };
        Ok(())
    }

    pub async fn config(&self) -> ApiConfig {
        self.state.read().await.config.clone()
    }

    async fn admin_request(&self, method: Method, path: &str) -> RequestBuilder {
        let state = self.state.read().await;
        let url = state.config.admin_url(path);
        prepare(&state, method, url)
    }

    async fn api_request(&self, method: Method, path: &str) -> RequestBuilder {
        let state = self.state.read().await;
        let url = state.config.api_url(path);
        prepare(&state, method, url)
    }
}

fn build_client(config: &ApiConfig) -> DiscoveryResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| DiscoveryError::Config {
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn prepare(state: &ClientState, method: Method, url: String) -> RequestBuilder {
    debug!(%method, %url, "Sending backend request");
    let builder = state
        .http
        .request(method, url)
        .header("Accept-Language", state.config.language.as_str())
        .header("X-Requested-With", "XMLHttpRequest");
    match &state.config.access_token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Pick the most specific message out of an error body
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> DiscoveryResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("Request failed with status {status}"));
        return Err(DiscoveryError::Transport {
            status: Some(status.as_u16()),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| DiscoveryError::Decode {
        message: e.to_string(),
    })
}

fn start_form(provider: LlmProvider, config: &StartConfig) -> Vec<(&'static str, String)> {
    let mut form = vec![("provider", provider.as_str().to_string())];
    if let Some(id) = config.search_config_id {
        form.push(("search_config_id", id.to_string()));
    }
    for section in &config.sections {
        form.push(("sections", section.clone()));
    }
    if let Some(date) = config.last_search_date {
        form.push(("last_search_date", date.format("%Y-%m-%d").to_string()));
    }
    form
}

#[async_trait]
impl DiscoveryApi for RealDiscoveryApi {
    async fn get_discovery_info(&self, scope: DiscoveryScope) -> DiscoveryResult<DiscoveryInfo> {
        let response = self
            .admin_request(Method::GET, endpoints(scope).info)
            .await
            .send()
            .await?;
        read_json(response).await
    }

    async fn start_discovery(
        &self,
        scope: DiscoveryScope,
        provider: LlmProvider,
        config: &StartConfig,
    ) -> DiscoveryResult<DiscoveryStatusPayload> {
        let request = self.admin_request(Method::POST, endpoints(scope).start).await;
        let request = match scope {
            DiscoveryScope::Resources => request.form(&start_form(provider, config)),
            DiscoveryScope::Manufacturers => request.json(&json!({ "provider": provider.as_str() })),
        };
        read_json(request.send().await?).await
    }

    async fn get_discovery_status(&self, scope: DiscoveryScope) -> DiscoveryResult<DiscoveryStatusPayload> {
        let response = self
            .admin_request(Method::GET, endpoints(scope).status)
            .await
            .send()
            .await?;
        read_json(response).await
    }

    async fn discover_for_single_item(
        &self,
        item_id: u64,
        provider: LlmProvider,
    ) -> DiscoveryResult<SingleItemResponse> {
        let path = format!("references/resources/{item_id}/discover_news/");
        let response = self
            .api_request(Method::POST, &path)
            .await
            .json(&json!({ "provider": provider.as_str() }))
            .send()
            .await?;
        read_json(response).await
    }

    async fn list_resources(&self) -> DiscoveryResult<Vec<TargetItem>> {
        let response = self
            .api_request(Method::GET, "references/resources/")
            .await
            .send()
            .await?;
        let listing: Listing<TargetItem> = read_json(response).await?;
        Ok(listing.into_items())
    }

    async fn list_providers(&self) -> DiscoveryResult<ProvidersResponse> {
        let response = self
            .api_request(Method::GET, "references/resources/available_providers/")
            .await
            .send()
            .await?;
        read_json(response).await
    }

    async fn list_drafts(&self, created_after: Option<DateTime<Utc>>) -> DiscoveryResult<Vec<DraftItem>> {
        let mut query = vec![("ordering", "-created_at".to_string())];
        if let Some(since) = created_after {
            query.push(("created_at__gte", since.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        let response = self
            .api_request(Method::GET, "news/drafts/")
            .await
            .query(&query)
            .send()
            .await?;
        let listing: Listing<DraftItem> = read_json(response).await?;
        Ok(listing.into_items())
    }
}
