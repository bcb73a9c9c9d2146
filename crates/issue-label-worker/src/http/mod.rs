//! HTTP implementations of the collaborator traits.
//!
//! | Type | Trait(s) | Service |
//! |------|----------|---------|
//! | [`GithubClient`] | `IssueTextSource`, `RepoSettingsSource`, `LabelSink` | GitHub REST |
//! | [`HttpIssueEmbedder`] | `IssueEmbedder` | embedding service |
//! | [`HttpTextClassifier`] | `TextClassifier` | remote universal / org models |
//! | [`GcsArtifactStore`] | `ArtifactStore` | object storage media download |
//! | [`PubSubPullSource`] | `MessageSource` | Pub/Sub REST pull |
//!
//! Every client is built once with its headers and timeout baked in and
//! then shared by `&self`.

mod classifier;
mod embedding;
mod github;
mod pubsub;
mod storage;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};

use crate::error::{WorkerError, WorkerResult};

pub use classifier::HttpTextClassifier;
pub use embedding::{decode_embedding, HttpIssueEmbedder};
pub use github::GithubClient;
pub use pubsub::PubSubPullSource;
pub use storage::GcsArtifactStore;

const CLIENT_USER_AGENT: &str = concat!("issue-label-worker/", env!("CARGO_PKG_VERSION"));

/// Error bodies are cut to this many characters.
const ERROR_BODY_MAX_CHARS: usize = 800;

/// Default request timeout for clients that have no dedicated setting.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn header_value(name: &str, value: &str) -> WorkerResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| WorkerError::Config(format!("invalid {} header: {}", name, e)))
}

pub(crate) fn bearer(token: &str) -> WorkerResult<HeaderValue> {
    header_value("authorization", &format!("Bearer {}", token.trim()))
}

/// Build a client with the shared user agent plus `extra` default headers.
pub(crate) fn build_client(
    extra: Vec<(HeaderName, HeaderValue)>,
    timeout: Duration,
) -> WorkerResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    for (name, value) in extra {
        headers.insert(name, value);
    }

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

/// Optional bearer token as a default header.
pub(crate) fn auth_headers(token: Option<&str>) -> WorkerResult<Vec<(HeaderName, HeaderValue)>> {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => Ok(vec![(AUTHORIZATION, bearer(token)?)]),
        None => Ok(Vec::new()),
    }
}

/// Pass a success response through; turn anything else into `WorkerError::Http`.
pub(crate) async fn ensure_success(operation: &str, response: Response) -> WorkerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(WorkerError::Http {
        operation: operation.to_string(),
        status: status.as_u16(),
        body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
    })
}

pub(crate) fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

pub(crate) fn trim_base(api_base: &str) -> String {
    api_base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_error() {
        assert_eq!(truncate_for_error("short", 10), "short");
        assert_eq!(truncate_for_error("abcdef", 3), "abc...");
    }

    #[test]
    fn test_auth_headers_skip_blank_token() {
        assert!(auth_headers(None).unwrap().is_empty());
        assert!(auth_headers(Some("  ")).unwrap().is_empty());

        let headers = auth_headers(Some("secret")).unwrap();
        assert_eq!(headers[0].1, "Bearer secret");
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let err = header_value("token", "bad\nvalue").unwrap_err();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn test_trim_base() {
        assert_eq!(trim_base("https://api.github.com/"), "https://api.github.com");
    }
}
