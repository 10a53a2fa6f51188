//! HTTP transport for the remote SQL service.
//!
//! Every request carries the service key as a bearer token plus the
//! `apikey` header expected by the gateway.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{DeployError, Result};
use crate::executor::candidate::{Candidate, Payload};
use crate::executor::SqlTransport;

/// Header carrying the project API key.
const API_KEY_HEADER: &str = "apikey";

/// Path requested by [`HttpTransport::ping`].
const PING_PATH: &str = "rest/v1/";

/// Path segments of the REST gateway's table routes.
const TABLE_PATH: [&str; 2] = ["rest", "v1"];

/// Longest response body excerpt kept in debug logs.
const BODY_EXCERPT_CHARS: usize = 200;

/// Remote SQL transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    service_key: String,
    api_key: String,
}

impl HttpTransport {
    /// Creates a transport with explicit credentials and optional timeout.
    pub fn new(
        service_key: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DeployError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            service_key: service_key.into(),
            api_key: api_key.into(),
        })
    }

    /// Creates a transport from the remote configuration.
    pub fn from_config(remote: &RemoteConfig) -> Result<Self> {
        Self::new(remote.service_key()?, remote.api_key()?, remote.timeout())
    }

    /// Checks that the REST gateway answers authenticated requests.
    ///
    /// Returns the response status; 2xx means reachable.
    pub async fn ping(&self, base: &Url) -> Result<StatusCode> {
        let url = format!("{}/{}", base.as_str().trim_end_matches('/'), PING_PATH);
        debug!("Pinging {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| DeployError::transport(format!("GET {url}: {e}")))?;

        Ok(response.status())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header(API_KEY_HEADER, &self.api_key)
    }
}

/// Builds `<base>/rest/v1/<table>?select=*&limit=1`.
fn table_url(base: &Url, table: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DeployError::config(format!("Invalid remote URL '{base}'")))?
        .pop_if_empty()
        .extend(TABLE_PATH)
        .push(table);
    url.query_pairs_mut()
        .append_pair("select", "*")
        .append_pair("limit", "1");
    Ok(url)
}

#[async_trait]
impl SqlTransport for HttpTransport {
    async fn execute(&self, candidate: &Candidate, statement: &str) -> Result<StatusCode> {
        let request = self
            .authorized(self.client.post(candidate.url.clone()))
            .header(CONTENT_TYPE, candidate.content_type());

        let request = match candidate.payload(statement) {
            Payload::Json(value) => request.json(&value),
            Payload::Text(text) => request.body(text),
        };

        let response = request
            .send()
            .await
            .map_err(|e| DeployError::transport(format!("{candidate}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Body is only diagnostic; a read failure does not change the verdict.
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            debug!("{} answered {}: {}", candidate, status, excerpt);
        }

        Ok(status)
    }

    async fn table_status(&self, base: &Url, table: &str) -> Result<StatusCode> {
        let url = table_url(base, table)?;
        debug!("Reading {}", url);

        let response = self
            .authorized(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| DeployError::transport(format!("GET {url}: {e}")))?;

        Ok(response.status())
    }
}
