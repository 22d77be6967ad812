use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::types::SchemaRegistryConfig;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid registry url: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// HTTP client for a Confluent-compatible schema registry.
#[derive(Debug, Clone)]
pub struct SchemaRegistryClient {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectSchema {
    pub subject: String,
    pub version: i32,
    pub id: u32,
    pub schema: String,
}

#[derive(Debug, Deserialize)]
struct SchemaById {
    schema: String,
}

impl SchemaRegistryClient {
    pub fn new(config: &SchemaRegistryConfig) -> Result<Self> {
        let base_url =
            Url::parse(&config.url).map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(RegistryError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }

    /// Raw schema text registered under a global id.
    pub async fn get_schema_by_id(&self, id: u32) -> Result<String> {
        let url = self.endpoint(&["schemas", "ids", &id.to_string()])?;
        let body: SchemaById = self.get_json(url).await?;
        Ok(body.schema)
    }

    pub async fn get_subjects(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["subjects"])?;
        self.get_json(url).await
    }

    pub async fn get_subject_versions(&self, subject: &str) -> Result<Vec<i32>> {
        let url = self.endpoint(&["subjects", subject, "versions"])?;
        self.get_json(url).await
    }

    pub async fn get_subject_version_schema(&self, subject: &str, version: i32) -> Result<SubjectSchema> {
        let url = self.endpoint(&["subjects", subject, "versions", &version.to_string()])?;
        self.get_json(url).await
    }
}
