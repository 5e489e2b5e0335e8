//! Blocking GitHub REST client

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{ActionsApi, ActionsPermissions, RepositoryInfo};
use crate::config::settings::{ApiSettings, GithubSettings};
use crate::crypto::SecureString;
use crate::error::{ShieldError, ShieldResult};

const API_VERSION: &str = "2022-11-28";

/// Request body for `PUT /actions/permissions`
#[derive(Serialize)]
struct SetPermissionsRequest<'a> {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_actions: Option<&'a str>,
}

/// GitHub REST client scoped to one repository
pub struct GithubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: SecureString,
}

impl GithubClient {
    pub fn new(
        github: &GithubSettings,
        api: &ApiSettings,
        owner: &str,
        repo: &str,
        token: SecureString,
    ) -> ShieldResult<Self> {
        if token.is_empty() {
            return Err(ShieldError::Config(
                "GitHub token not available".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(api.user_agent.as_str())
            .timeout(Duration::from_millis(api.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            api_url: github.api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token,
        })
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, suffix)
    }

    fn send(&self, request: RequestBuilder, context: &str) -> ShieldResult<Response> {
        let response = request
            .bearer_auth(self.token.as_str())
            .send()
            .map_err(|e| ShieldError::remote(context, None, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ShieldError::remote(context, Some(status.as_u16()), body));
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, suffix: &str, context: &str) -> ShieldResult<T> {
        let response = self.send(self.client.get(self.repo_url(suffix)), context)?;
        response
            .json()
            .map_err(|e| ShieldError::remote(context, None, format!("invalid response: {}", e)))
    }
}

impl ActionsApi for GithubClient {
    fn actions_permissions(&self) -> ShieldResult<ActionsPermissions> {
        self.get_json("/actions/permissions", "Failed to get GitHub Actions permissions")
    }

    fn set_actions_permissions(&self, permissions: &ActionsPermissions) -> ShieldResult<()> {
        let body = SetPermissionsRequest {
            enabled: permissions.enabled,
            allowed_actions: permissions.allowed_actions.as_deref(),
        };
        self.send(
            self.client
                .put(self.repo_url("/actions/permissions"))
                .json(&body),
            "Failed to set GitHub Actions permissions",
        )?;

        debug!("GitHub Actions permissions updated: enabled={}", permissions.enabled);
        Ok(())
    }

    fn repository_info(&self) -> ShieldResult<RepositoryInfo> {
        self.get_json("", "Failed to get repository information")
    }
}
