use crate::errors::ClientError;
use crate::types::{DataResponse, DataSource};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Executes data source queries against the Data API.
#[async_trait]
pub trait DataApi: Send + Sync {
    async fn fetch(&self, source: &DataSource) -> Result<DataResponse, ClientError>;
}

/// Data API client backed by reqwest.
#[derive(Clone)]
pub struct DataClient {
    client: reqwest::Client,
    base_url: String,
}

impl DataClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(DataClient {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Full request URL for `source`. Uses the same canonical encoding as the
    /// coalescing key, so equal keys always mean equal upstream requests.
    pub fn build_url(&self, source: &DataSource) -> String {
        format!("{}{}", self.base_url, source.canonical_path())
    }
}

#[async_trait]
impl DataApi for DataClient {
    async fn fetch(&self, source: &DataSource) -> Result<DataResponse, ClientError> {
        let url = self.build_url(source);
        let url = Url::parse(&url).map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))?;

        tracing::debug!(url = %url, "Requesting performance data");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        parse_data_response(status, &body)
    }
}

fn parse_data_response(
    status: http::StatusCode,
    body: &[u8],
) -> Result<DataResponse, ClientError> {
    match serde_json::from_slice::<DataResponse>(body) {
        Ok(response) if response.is_error() => Err(ClientError::Upstream {
            message: response.message.unwrap_or_default(),
        }),
        Ok(_) | Err(_) if !status.is_success() => Err(ClientError::Status(status)),
        Ok(response) => Ok(response),
        Err(e) => Err(ClientError::Decode(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::TestServer;
    use crate::types::QueryParams;
    use http::StatusCode;
    use serde_json::json;

    fn weekly_visitors() -> DataSource {
        DataSource::new(
            "govuk",
            "visitors",
            QueryParams {
                period: Some("week".into()),
                duration: 9,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_build_url() {
        let base = Url::parse("https://www.performance.service.gov.uk/").unwrap();
        let client = DataClient::new(&base, Duration::from_secs(1)).unwrap();

        assert_eq!(
            client.build_url(&weekly_visitors()),
            "https://www.performance.service.gov.uk/data/govuk/visitors?duration=9&period=week"
        );
    }

    #[test]
    fn test_parse_data_response() {
        let ok = parse_data_response(StatusCode::OK, br#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(ok.data, json!([1, 2]));

        // Error documents win over the HTTP status
        let err = parse_data_response(
            StatusCode::BAD_REQUEST,
            br#"{"status": "error", "message": "invalid period"}"#,
        );
        assert!(matches!(
            err,
            Err(ClientError::Upstream { message }) if message == "invalid period"
        ));

        assert!(matches!(
            parse_data_response(StatusCode::BAD_GATEWAY, b"<html>"),
            Err(ClientError::Status(StatusCode::BAD_GATEWAY))
        ));
        assert!(matches!(
            parse_data_response(StatusCode::OK, b"<html>"),
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch() {
        let server = TestServer::start(|path_and_query| {
            assert_eq!(path_and_query, "/data/govuk/visitors?duration=9&period=week");
            (
                StatusCode::OK,
                json!({"data": [{"_count": 3}], "warning": "experimental"}).to_string(),
            )
        })
        .await;

        let base = Url::parse(&server.base_url()).unwrap();
        let client = DataClient::new(&base, Duration::from_secs(5)).unwrap();

        let response = client.fetch(&weekly_visitors()).await.unwrap();
        assert_eq!(response.data, json!([{"_count": 3}]));
        assert_eq!(response.warning.as_deref(), Some("experimental"));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_fetch_upstream_error() {
        let server = TestServer::start(|_| {
            (
                StatusCode::OK,
                json!({"status": "error", "message": "no such data set"}).to_string(),
            )
        })
        .await;

        let base = Url::parse(&server.base_url()).unwrap();
        let client = DataClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.fetch(&weekly_visitors()).await.unwrap_err();
        assert_eq!(err.to_string(), "upstream error: no such data set");
    }
}
