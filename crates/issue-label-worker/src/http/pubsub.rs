//! Pub/Sub REST pull subscription.
//!
//! Each pull asks for at most one message; together with the consumer
//! processing inline this is the flow-control limit of one outstanding
//! message.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{auth_headers, build_client, ensure_success, trim_base, DEFAULT_REQUEST_TIMEOUT};
use crate::consumer::{MessageSource, ReceivedMessage};
use crate::error::{WorkerError, WorkerResult};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<WireReceivedMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceivedMessage {
    ack_id: String,
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(default)]
    message_id: String,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

pub struct PubSubPullSource {
    http: Client,
    subscription_url: String,
    max_messages: usize,
}

impl PubSubPullSource {
    pub fn new(
        api_base: &str,
        project_id: &str,
        subscription: &str,
        access_token: Option<&str>,
    ) -> WorkerResult<Self> {
        if project_id.is_empty() || subscription.is_empty() {
            return Err(WorkerError::Config(
                "pubsub.project_id and pubsub.subscription are required".into(),
            ));
        }

        Ok(Self {
            http: build_client(auth_headers(access_token)?, DEFAULT_REQUEST_TIMEOUT)?,
            subscription_url: format!(
                "{}/projects/{}/subscriptions/{}",
                trim_base(api_base),
                project_id,
                subscription
            ),
            max_messages: 1,
        })
    }

    pub fn subscription_url(&self) -> &str {
        &self.subscription_url
    }
}

#[async_trait]
impl MessageSource for PubSubPullSource {
    async fn pull(&self) -> WorkerResult<Option<ReceivedMessage>> {
        let response = self
            .http
            .post(format!("{}:pull", self.subscription_url))
            .json(&json!({ "maxMessages": self.max_messages }))
            .send()
            .await?;
        let pulled: PullResponse = ensure_success("pull", response).await?.json().await?;

        let mut messages = pulled.received_messages.into_iter();
        let Some(first) = messages.next() else {
            return Ok(None);
        };
        if messages.next().is_some() {
            return Err(WorkerError::InvalidMessage(format!(
                "pull returned more than {} message(s)",
                self.max_messages
            )));
        }

        Ok(Some(ReceivedMessage {
            ack_id: first.ack_id,
            message_id: first.message.message_id,
            attributes: first.message.attributes,
        }))
    }

    async fn acknowledge(&self, ack_id: &str) -> WorkerResult<()> {
        let response = self
            .http
            .post(format!("{}:acknowledge", self.subscription_url))
            .json(&json!({ "ackIds": [ack_id] }))
            .send()
            .await?;
        ensure_success("acknowledge", response).await?;
        Ok(())
    }
}
