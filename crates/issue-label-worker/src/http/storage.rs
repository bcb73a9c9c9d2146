//! Object storage media download.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use issue_label_core::error::CoreResult;
use issue_label_core::traits::ArtifactStore;

use super::{auth_headers, build_client, ensure_success, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{WorkerError, WorkerResult};

const SERVICE: &str = "storage";

pub struct GcsArtifactStore {
    http: Client,
    api_base: Url,
}

impl GcsArtifactStore {
    pub fn new(api_base: &str, access_token: Option<&str>) -> WorkerResult<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| WorkerError::Config(format!("invalid storage.api_base {}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(WorkerError::Config(format!(
                "storage.api_base {} cannot be a base URL",
                api_base
            )));
        }

        Ok(Self {
            http: build_client(auth_headers(access_token)?, DEFAULT_REQUEST_TIMEOUT)?,
            api_base,
        })
    }

    /// `{api_base}/storage/v1/b/{bucket}/o/{object}?alt=media`, the object
    /// name percent-encoded as a single path segment.
    pub fn media_url(&self, bucket: &str, object: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "b", bucket, "o", object]);
        }
        url.query_pairs_mut().append_pair("alt", "media");
        url
    }

    async fn fetch_to(&self, bucket: &str, object: &str, destination: &Path) -> WorkerResult<()> {
        let url = self.media_url(bucket, object);
        debug!(%url, destination = %destination.display(), "Downloading artifact");

        let response = self.http.get(url).send().await?;
        let bytes = ensure_success("download object", response).await?.bytes().await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for GcsArtifactStore {
    async fn download(&self, bucket: &str, object: &str, destination: &Path) -> CoreResult<()> {
        self.fetch_to(bucket, object, destination)
            .await
            .map_err(|e| e.into_core(SERVICE))
    }
}
