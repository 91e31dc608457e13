use crate::errors::ClientError;
use crate::types::{Dashboard, Dashboards};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Read access to dashboard metadata.
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Fetches a single dashboard by slug.
    async fn fetch(&self, slug: &str) -> Result<Dashboard, ClientError>;

    /// Fetches every dashboard known to the Config API.
    async fn fetch_all(&self) -> Result<Dashboards, ClientError>;
}

/// Config API client backed by reqwest.
#[derive(Clone)]
pub struct ConfigClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ConfigClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ConfigClient { client, base_url })
    }

    pub fn dashboard_url(&self, slug: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("slug", slug);
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        tracing::debug!(url = %url, "Requesting dashboard metadata");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ConfigApi for ConfigClient {
    async fn fetch(&self, slug: &str) -> Result<Dashboard, ClientError> {
        self.get_json(self.dashboard_url(slug)).await
    }

    async fn fetch_all(&self) -> Result<Dashboards, ClientError> {
        self.get_json(self.base_url.clone()).await
    }
}
