use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use url::Url;

use super::RelationFetcher;
use crate::config::Config;
use crate::error::{DocflowError, Result};
use crate::graph::RelationSet;

/// Relationship API client
///
/// Issues `GET {relations_url}?$sourceid=..&$sourcetype=..` with HTTP Basic
/// authentication and decodes the `{ value: [...] }` body.
pub struct HttpRelationFetcher {
    client: Client,
    relations_url: Url,
    authorization: String,
}

impl HttpRelationFetcher {
    /// Create a fetcher against an explicit endpoint
    ///
    /// # Arguments
    ///
    /// * `relations_url` - Full URL of the relations endpoint
    /// * `username` / `password` - Basic authentication credentials
    /// * `timeout` - Per-request timeout
    pub fn new(
        relations_url: Url,
        username: &str,
        password: &str,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocflowError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            relations_url,
            authorization: basic_authorization(username, password),
        })
    }

    /// Build from configuration, reading credentials from the configured env vars
    pub fn from_config(config: &Config) -> Result<Self> {
        let username = read_env(&config.api.username_env)?;
        let password = read_env(&config.api.password_env)?;
        let url = config
            .relations_url()
            .map_err(|e| DocflowError::Config(e.to_string()))?;

        Self::new(url, &username, &password, config.api_timeout())
    }

    /// Request URL for one object
    pub fn request_url(&self, object_id: &str, object_type: &str) -> Url {
        let mut url = self.relations_url.clone();
        url.query_pairs_mut()
            .append_pair("$sourceid", object_id)
            .append_pair("$sourcetype", object_type);
        url
    }
}

fn read_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        DocflowError::Config(format!(
            "Environment variable {} not set. Set it in your .env file or as an environment variable.",
            name
        ))
    })
}

fn basic_authorization(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

#[async_trait]
impl RelationFetcher for HttpRelationFetcher {
    async fn fetch_relations(&self, object_id: &str, object_type: &str) -> Result<RelationSet> {
        let url = self.request_url(object_id, object_type);
        log::debug!("Fetching relations for {} (type {})", object_id, object_type);

        let response = self
            .client
            .get(url)
            .header("Authorization", &self.authorization)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| DocflowError::Fetch(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(DocflowError::Fetch(format!(
                "Relationship API error {}: {}",
                status, body
            )));
        }

        response
            .json::<RelationSet>()
            .await
            .map_err(|e| DocflowError::Fetch(format!("Failed to parse response: {}", e)))
    }
}
