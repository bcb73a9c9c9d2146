//! GitHub REST client: issue text, repository settings, labels and comments.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use issue_label_core::error::CoreResult;
use issue_label_core::repo_config::{RepoLabelSettings, REPO_SETTINGS_PATH};
use issue_label_core::traits::{IssueText, IssueTextSource, LabelSink, RepoSettingsSource};

use super::{auth_headers, build_client, ensure_success, trim_base, DEFAULT_REQUEST_TIMEOUT};
use crate::error::WorkerResult;

const SERVICE: &str = "github";
const RAW_CONTENT: &str = "application/vnd.github.raw+json";

#[derive(Debug, Deserialize)]
struct IssueResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    api_base: String,
}

impl GithubClient {
    /// Client authenticated with `token` when one is given.
    pub fn new(api_base: &str, token: Option<&str>) -> WorkerResult<Self> {
        let mut headers = vec![
            (ACCEPT, HeaderValue::from_static("application/vnd.github+json")),
            (
                HeaderName::from_static("x-github-api-version"),
                HeaderValue::from_static("2022-11-28"),
            ),
        ];
        headers.extend(auth_headers(token)?);

        Ok(Self {
            http: build_client(headers, DEFAULT_REQUEST_TIMEOUT)?,
            api_base: trim_base(api_base),
        })
    }

    fn issue_url(&self, org: &str, repo: &str, issue_num: u64) -> String {
        format!("{}/repos/{}/{}/issues/{}", self.api_base, org, repo, issue_num)
    }

    pub async fn fetch_issue(&self, org: &str, repo: &str, issue_num: u64) -> WorkerResult<IssueText> {
        let response = self.http.get(self.issue_url(org, repo, issue_num)).send().await?;
        let issue: IssueResponse = ensure_success("get issue", response).await?.json().await?;
        Ok(IssueText {
            title: issue.title.unwrap_or_default(),
            body: issue.body.unwrap_or_default(),
        })
    }

    /// Raw text of the repository settings file; `None` when absent.
    pub async fn fetch_settings_yaml(&self, org: &str, repo: &str) -> WorkerResult<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, org, repo, REPO_SETTINGS_PATH
        );
        let response = self
            .http
            .get(url)
            .header(ACCEPT, RAW_CONTENT)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(repo_owner = %org, repo_name = %repo, "No repository settings file");
            return Ok(None);
        }
        let text = ensure_success("get repository settings", response)
            .await?
            .text()
            .await?;
        Ok(Some(text))
    }

    pub async fn post_labels(&self, org: &str, repo: &str, issue_num: u64, labels: &[String]) -> WorkerResult<()> {
        let url = format!("{}/labels", self.issue_url(org, repo, issue_num));
        let response = self
            .http
            .post(url)
            .json(&json!({ "labels": labels }))
            .send()
            .await?;
        ensure_success("add labels", response).await?;
        Ok(())
    }

    pub async fn post_comment(&self, org: &str, repo: &str, issue_num: u64, body: &str) -> WorkerResult<()> {
        let url = format!("{}/comments", self.issue_url(org, repo, issue_num));
        let response = self
            .http
            .post(url)
            .json(&json!({ "body": body }))
            .send()
            .await?;
        ensure_success("create comment", response).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueTextSource for GithubClient {
    async fn get_issue_text(&self, issue_num: u64, org: &str, repo: &str) -> CoreResult<IssueText> {
        self.fetch_issue(org, repo, issue_num)
            .await
            .map_err(|e| e.into_core(SERVICE))
    }
}

#[async_trait]
impl RepoSettingsSource for GithubClient {
    async fn repo_settings(&self, org: &str, repo: &str) -> CoreResult<Option<RepoLabelSettings>> {
        let yaml = self
            .fetch_settings_yaml(org, repo)
            .await
            .map_err(|e| e.into_core(SERVICE))?;
        yaml.map(|text| RepoLabelSettings::from_yaml(&text)).transpose()
    }
}

#[async_trait]
impl LabelSink for GithubClient {
    async fn add_labels(
        &self,
        installation_id: &str,
        org: &str,
        repo: &str,
        issue_num: u64,
        labels: &[String],
    ) -> CoreResult<()> {
        debug!(installation_id, repo_owner = %org, repo_name = %repo, issue_num, ?labels, "Adding labels");
        self.post_labels(org, repo, issue_num, labels)
            .await
            .map_err(|e| e.into_core(SERVICE))
    }

    async fn create_comment(
        &self,
        installation_id: &str,
        org: &str,
        repo: &str,
        issue_num: u64,
        body: &str,
    ) -> CoreResult<()> {
        debug!(installation_id, repo_owner = %org, repo_name = %repo, issue_num, "Posting comment");
        self.post_comment(org, repo, issue_num, body)
            .await
            .map_err(|e| e.into_core(SERVICE))
    }
}
