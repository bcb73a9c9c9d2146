//! Remote text classifier behind the universal and org models.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use issue_label_core::error::{CoreError, CoreResult};
use issue_label_core::traits::TextClassifier;
use issue_label_core::types::ProbabilityMap;

use super::{auth_headers, build_client, ensure_success};
use crate::error::WorkerResult;

/// POSTs `{title, body}` and expects a JSON object of label to score.
pub struct HttpTextClassifier {
    http: Client,
    endpoint: String,
    service: String,
}

impl HttpTextClassifier {
    /// `service` names the classifier in errors, e.g. `"universal"` or an org.
    pub fn new(
        service: impl Into<String>,
        endpoint: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> WorkerResult<Self> {
        Ok(Self {
            http: build_client(auth_headers(token)?, timeout)?,
            endpoint: endpoint.to_string(),
            service: service.into(),
        })
    }

    async fn scores(&self, title: &str, body: &str) -> WorkerResult<ProbabilityMap> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "title": title, "body": body }))
            .send()
            .await?;
        let scores = ensure_success("classify issue", response)
            .await?
            .json::<ProbabilityMap>()
            .await?;
        Ok(scores)
    }
}

#[async_trait]
impl TextClassifier for HttpTextClassifier {
    async fn classify(&self, title: &str, body: &str) -> CoreResult<ProbabilityMap> {
        let scores = self
            .scores(title, body)
            .await
            .map_err(|e| e.into_core(&self.service))?;

        if let Some((label, value)) = scores
            .iter()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(CoreError::InvalidProbability {
                label: label.clone(),
                value: *value,
            });
        }
        Ok(scores)
    }
}
