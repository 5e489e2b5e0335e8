//! GitHub platform integration
//!
//! This module provides:
//! - The [`ActionsApi`] seam over the repository REST endpoints
//! - A blocking reqwest implementation ([`GithubClient`])
//! - Actions suspension with crash-safe state ([`ActionsSuspensionManager`])
//! - The repository details the vault needs to activate an endpoint

pub mod client;
pub mod suspension;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::GithubContext;
use crate::error::ShieldResult;

pub use client::GithubClient;
pub use suspension::{ActionsSuspensionManager, ResumeOutcome, SuspensionState};

/// Actions permissions of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsPermissions {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_actions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_actions_url: Option<String>,
}

impl ActionsPermissions {
    /// Actions enabled with the platform defaults
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            allowed_actions: None,
            selected_actions_url: None,
        }
    }

    /// Actions disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::enabled()
        }
    }
}

/// The subset of repository metadata we use
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
}

/// Repository calls needed around a restore
pub trait ActionsApi {
    /// Current Actions permissions
    fn actions_permissions(&self) -> ShieldResult<ActionsPermissions>;

    /// Replace the Actions permissions
    fn set_actions_permissions(&self, permissions: &ActionsPermissions) -> ShieldResult<()>;

    /// Repository metadata
    fn repository_info(&self) -> ShieldResult<RepositoryInfo>;
}

/// Endpoint details sent to the vault when activating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationDetails {
    /// Repository id, stable across renames
    pub unique_id: String,
    pub ip: String,
    pub operating_system: String,
    pub endpoint_type: String,
    pub endpoint_name: String,
}

/// Build the activation details for the current repository
pub fn repository_activation_details(
    api: &dyn ActionsApi,
    context: &GithubContext,
    endpoint_type: &str,
) -> ShieldResult<ActivationDetails> {
    info!("Fetching repository details for activation");
    let repo_info = api.repository_info()?;

    Ok(ActivationDetails {
        unique_id: repo_info.id.to_string(),
        ip: if context.runner_ip.is_empty() {
            "127.0.0.1".to_string()
        } else {
            context.runner_ip.clone()
        },
        operating_system: operating_system(&context.runner_os).to_string(),
        endpoint_type: endpoint_type.to_string(),
        endpoint_name: context.repo.clone(),
    })
}

/// Map a runner OS name to the vault's operating system names
fn operating_system(runner_os: &str) -> &'static str {
    match runner_os {
        "Linux" => "Linux",
        "Windows" => "Windows",
        "macOS" => "MacOS",
        other => {
            warn!("Unexpected operating system '{}', assuming Linux", other);
            "Linux"
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;
    use crate::error::ShieldError;

    /// In-memory [`ActionsApi`] that records every permissions change
    pub struct FakeActionsApi {
        pub current: RefCell<ActionsPermissions>,
        pub set_calls: RefCell<Vec<ActionsPermissions>>,
        /// Number of upcoming `set_actions_permissions` calls that fail
        pub failing_sets: RefCell<usize>,
        pub fail_reads: bool,
    }

    impl FakeActionsApi {
        pub fn new(current: ActionsPermissions) -> Self {
            Self {
                current: RefCell::new(current),
                set_calls: RefCell::new(Vec::new()),
                failing_sets: RefCell::new(0),
                fail_reads: false,
            }
        }
    }

    impl ActionsApi for FakeActionsApi {
        fn actions_permissions(&self) -> ShieldResult<ActionsPermissions> {
            if self.fail_reads {
                return Err(ShieldError::remote("Failed to get Actions permissions", Some(403), "forbidden"));
            }
            Ok(self.current.borrow().clone())
        }

        fn set_actions_permissions(&self, permissions: &ActionsPermissions) -> ShieldResult<()> {
            self.set_calls.borrow_mut().push(permissions.clone());
            let mut failing = self.failing_sets.borrow_mut();
            if *failing > 0 {
                *failing -= 1;
                return Err(ShieldError::remote("Failed to set Actions permissions", Some(502), "bad gateway"));
            }
            *self.current.borrow_mut() = permissions.clone();
            Ok(())
        }

        fn repository_info(&self) -> ShieldResult<RepositoryInfo> {
            Ok(RepositoryInfo {
                id: 987654,
                name: "widgets".to_string(),
                full_name: "octo/widgets".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeActionsApi;
    use super::*;

    #[test]
    fn test_activation_details() {
        let api = FakeActionsApi::new(ActionsPermissions::enabled());
        let mut context = GithubContext::new("octo", "widgets");
        context.runner_os = "macOS".to_string();
        context.runner_ip = "10.0.0.7".to_string();

        let details = repository_activation_details(&api, &context, "PC").unwrap();

        assert_eq!(details.unique_id, "987654");
        assert_eq!(details.operating_system, "MacOS");
        assert_eq!(details.ip, "10.0.0.7");
        assert_eq!(details.endpoint_type, "PC");
        assert_eq!(details.endpoint_name, "widgets");
    }

    #[test]
    fn test_unknown_os_defaults_to_linux() {
        assert_eq!(operating_system("Plan9"), "Linux");
        assert_eq!(operating_system("Windows"), "Windows");
    }

    #[test]
    fn test_activation_details_wire_names() {
        let details = ActivationDetails {
            unique_id: "1".into(),
            ip: "127.0.0.1".into(),
            operating_system: "Linux".into(),
            endpoint_type: "PC".into(),
            endpoint_name: "widgets".into(),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["uniqueId"], "1");
        assert_eq!(json["operatingSystem"], "Linux");
        assert_eq!(json["endpointName"], "widgets");
    }

    #[test]
    fn test_permissions_skip_missing_fields() {
        let json = serde_json::to_string(&ActionsPermissions::disabled()).unwrap();
        assert_eq!(json, r#"{"enabled":false}"#);
    }
}
