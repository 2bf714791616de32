use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::error::DexError;
use crate::model::{Ability, Form, GrowthRate, ListQuery, NamedPage, Species, Variant};

/// The remote catalog, as an opaque keyed record service.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_species(&self, query: &ListQuery) -> Result<NamedPage, DexError>;
    async fn species(&self, name: &str) -> Result<Species, DexError>;
    async fn pokemon(&self, name: &str) -> Result<Variant, DexError>;
    async fn pokemon_form(&self, name: &str) -> Result<Form, DexError>;
    async fn ability(&self, name: &str) -> Result<Ability, DexError>;
    async fn list_growth_rates(&self, query: &ListQuery) -> Result<NamedPage, DexError>;
    async fn growth_rate(&self, name: &str) -> Result<GrowthRate, DexError>;
}

#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str) -> Result<Self, DexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dex-export/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DexError::CatalogHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| DexError::CatalogHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn resource_url(&self, endpoint: &str, name: &str) -> String {
        format!("{}/{endpoint}/{name}", self.base_url)
    }

    fn list_url(&self, endpoint: &str, query: &ListQuery) -> String {
        format!(
            "{}/{endpoint}?limit={}&offset={}",
            self.base_url, query.limit, query.offset
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DexError> {
        let response = self.send_with_retries(url).await?;
        let response = Self::handle_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| DexError::CatalogHttp(format!("{url}: {err}")))
    }

    async fn handle_status(response: reqwest::Response) -> Result<reqwest::Response, DexError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "catalog request failed".to_string());
        Err(DexError::CatalogStatus { status, message })
    }

    async fn send_with_retries(&self, url: &str) -> Result<reqwest::Response, DexError> {
        const MAX_RETRIES: u32 = 3;
        let mut attempt = 0;
        loop {
            let outcome = self.client.get(url).send().await;
            let retry = attempt < MAX_RETRIES
                && match &outcome {
                    Ok(resp) => is_retryable_status(resp.status().as_u16()),
                    Err(err) => is_retryable_error(err),
                };
            if !retry {
                return outcome.map_err(|err| DexError::CatalogHttp(format!("{url}: {err}")));
            }
            attempt += 1;
            tracing::debug!(url, attempt, "retrying catalog request");
            tokio::time::sleep(backoff(attempt)).await;
        }
    }
}

/// Linear backoff in 200ms steps.
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(200) * attempt
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_species(&self, query: &ListQuery) -> Result<NamedPage, DexError> {
        self.get_json(&self.list_url("pokemon-species", query)).await
    }

    async fn species(&self, name: &str) -> Result<Species, DexError> {
        self.get_json(&self.resource_url("pokemon-species", name))
            .await
    }

    async fn pokemon(&self, name: &str) -> Result<Variant, DexError> {
        self.get_json(&self.resource_url("pokemon", name)).await
    }

    async fn pokemon_form(&self, name: &str) -> Result<Form, DexError> {
        self.get_json(&self.resource_url("pokemon-form", name)).await
    }

    async fn ability(&self, name: &str) -> Result<Ability, DexError> {
        self.get_json(&self.resource_url("ability", name)).await
    }

    async fn list_growth_rates(&self, query: &ListQuery) -> Result<NamedPage, DexError> {
        self.get_json(&self.list_url("growth-rate", query)).await
    }

    async fn growth_rate(&self, name: &str) -> Result<GrowthRate, DexError> {
        self.get_json(&self.resource_url("growth-rate", name)).await
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
