//! Upstream metadata sources

use async_trait::async_trait;
use pacsmith_errors::{Error, NetworkError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metadata of one source package as published upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamPackage {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Depends", default)]
    pub depends: Vec<String>,
    #[serde(rename = "MakeDepends", default)]
    pub makedepends: Vec<String>,
}

/// Source of package versions and declared dependencies
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Look up `names`; unknown names are simply absent from the result
    async fn query(&self, names: &[String]) -> Result<Vec<UpstreamPackage>, Error>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<UpstreamPackage>,
}

/// Client for the AUR RPC interface (`type=info`, version 5)
#[derive(Debug, Clone)]
pub struct AurClient {
    client: Client,
    url: String,
    batch_size: usize,
}

impl AurClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration, batch_size: usize) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("pacsmith/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            batch_size: batch_size.max(1),
        })
    }

    async fn query_batch(&self, names: &[String]) -> Result<Vec<UpstreamPackage>, Error> {
        let mut params = vec![("v", "5"), ("type", "info")];
        params.extend(names.iter().map(|name| ("arg[]", name.as_str())));

        let response = self
            .client
            .get(&self.url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.request_error(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: format!("upstream query to {} failed", self.url),
            }
            .into());
        }

        let body: RpcResponse = response.json().await.map_err(|e| NetworkError::UpstreamQuery {
            message: format!("invalid response: {e}"),
        })?;

        if body.kind == "error" {
            return Err(NetworkError::UpstreamQuery {
                message: body.error.unwrap_or_else(|| "unknown error".to_string()),
            }
            .into());
        }

        Ok(body.results)
    }

    fn request_error(&self, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            NetworkError::Timeout {
                url: self.url.clone(),
            }
            .into()
        } else if e.is_connect() {
            NetworkError::ConnectionRefused(e.to_string()).into()
        } else {
            NetworkError::UpstreamQuery {
                message: e.to_string(),
            }
            .into()
        }
    }
}

#[async_trait]
impl UpstreamSource for AurClient {
    async fn query(&self, names: &[String]) -> Result<Vec<UpstreamPackage>, Error> {
        let mut found = Vec::with_capacity(names.len());
        for batch in names.chunks(self.batch_size) {
            found.extend(self.query_batch(batch).await?);
        }
        Ok(found)
    }
}
