//! HTTP client for the hosted content API
//!
//! A thin wrapper around reqwest: resolves the repository's master ref
//! once, then issues searches against `/documents/search`.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{ContentRepository, Query, SearchResponse};
use crate::config::PrismicConfig;
use crate::error::{ContentError, ContentResult};

/// Entry point document listing the repository's refs
#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Error body shape used by the API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Content API client, built once per process and shared by reference
pub struct PrismicClient {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    pub fn new(config: &PrismicConfig) -> ContentResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The ref every search is pinned to, fetched on first use
    async fn master_ref(&self) -> ContentResult<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let root: ApiRoot = self
                    .send_json(self.authorized(self.client.get(&self.endpoint)))
                    .await?;
                let master = root
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .ok_or(ContentError::MissingMasterRef)?;
                tracing::debug!("Resolved master ref {}", master.reference);
                Ok::<_, ContentError>(master.reference)
            })
            .await?;
        Ok(reference.as_str())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token)]),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ContentResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(ApiErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                Ok(ApiErrorBody {
                    error: Some(error), ..
                }) => error,
                _ => body,
            };
            return Err(ContentError::Api { status, message });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl ContentRepository for PrismicClient {
    async fn query(&self, query: &Query) -> ContentResult<SearchResponse> {
        let reference = self.master_ref().await?.to_string();
        let url = format!("{}/documents/search", self.endpoint);

        tracing::debug!("GET {} q={}", url, query.q());

        let mut params = vec![("ref", reference)];
        params.extend(query.to_params());
        let request = self.authorized(self.client.get(&url).query(&params));

        self.send_json(request).await
    }

    async fn fetch_page(&self, next_page: &str) -> ContentResult<SearchResponse> {
        tracing::debug!("GET {}", next_page);
        // Cursors come back with ref and access_token already embedded.
        self.send_json(self.client.get(next_page)).await
    }
}
