//! Embedding service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderName;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::warn;

use issue_label_core::error::CoreResult;
use issue_label_core::traits::IssueEmbedder;

use super::{build_client, header_value, truncate_for_error};
use crate::error::WorkerResult;

const SERVICE: &str = "embedding";

pub struct HttpIssueEmbedder {
    http: Client,
    endpoint: String,
    dimension: usize,
}

impl HttpIssueEmbedder {
    /// `api_key` travels in a `Token` header on every request.
    pub fn new(endpoint: &str, api_key: Option<&str>, dimension: usize, timeout: Duration) -> WorkerResult<Self> {
        let mut headers = Vec::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            headers.push((HeaderName::from_static("token"), header_value("token", key)?));
        }

        Ok(Self {
            http: build_client(headers, timeout)?,
            endpoint: endpoint.to_string(),
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    async fn fetch(&self, title: &str, body: &str) -> WorkerResult<Option<Vec<f32>>> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "title": title, "body": body }))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %truncate_for_error(&body, 200),
                "Embedding service returned no embedding"
            );
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        Ok(Some(decode_embedding(&bytes, self.dimension)))
    }
}

#[async_trait]
impl IssueEmbedder for HttpIssueEmbedder {
    async fn issue_embedding(&self, title: &str, body: &str) -> CoreResult<Option<Vec<f32>>> {
        self.fetch(title, body).await.map_err(|e| e.into_core(SERVICE))
    }
}

/// Little-endian `f32` values, truncated or zero-padded to `dimension`.
///
/// Trailing bytes that do not form a whole value are ignored.
pub fn decode_embedding(bytes: &[u8], dimension: usize) -> Vec<f32> {
    let mut values: Vec<f32> = bytes
        .chunks_exact(4)
        .take(dimension)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    values.resize(dimension, 0.0);
    values
}
