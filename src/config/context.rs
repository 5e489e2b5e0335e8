//! CI run context
//!
//! Repository coordinates and event details, read from the variables the
//! GitHub Actions runner exports.

use crate::error::{ShieldError, ShieldResult};

/// Details of the repository and the run that triggered us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubContext {
    pub owner: String,
    pub repo: String,
    pub event_name: String,
    pub git_ref: String,
    pub actor: String,
    /// `User` or `Organization`
    pub owner_type: String,
    pub runner_os: String,
    pub runner_ip: String,
}

impl GithubContext {
    /// Context for a repository with empty event details
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            event_name: String::new(),
            git_ref: String::new(),
            actor: String::new(),
            owner_type: "User".to_string(),
            runner_os: "Linux".to_string(),
            runner_ip: "127.0.0.1".to_string(),
        }
    }

    /// Read the context from the runner environment
    pub fn from_env() -> ShieldResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the context through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ShieldResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let repository = lookup("GITHUB_REPOSITORY").unwrap_or_default();
        let (owner, repo) = repository.split_once('/').ok_or_else(|| {
            ShieldError::Config(format!(
                "GITHUB_REPOSITORY must look like 'owner/repo' (got '{}')",
                repository
            ))
        })?;

        let var = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            event_name: var("GITHUB_EVENT_NAME", ""),
            git_ref: var("GITHUB_REF", ""),
            actor: var("GITHUB_ACTOR", ""),
            owner_type: var("OWNER_TYPE", "User"),
            runner_os: var("RUNNER_OS", "Linux"),
            runner_ip: var("RUNNER_IP", "127.0.0.1"),
        })
    }

    /// `owner/repo` slug
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
