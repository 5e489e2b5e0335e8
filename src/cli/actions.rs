//! `resume-actions` command
//!
//! Manual recovery for a restore that died while Actions were suspended.

use clap::Args;
use tracing::{error, info, warn};

use super::GlobalArgs;
use crate::config::GithubContext;
use crate::error::{ShieldError, ShieldResult};
use crate::github::{ActionsSuspensionManager, GithubClient, ResumeOutcome};
use crate::logging::mask_secret;

#[derive(Args, Debug, Clone)]
pub struct ResumeActionsArgs {
    /// Token able to manage the repository's Actions permissions
    #[arg(long, env = "INPUT_ICREDIBLE_REPOSITORY_RESTORE_TOKEN", hide_env_values = true)]
    pub restore_token: Option<String>,
}

/// Restore Actions permissions from the saved suspension state
///
/// Returns whether Actions are enabled afterwards.
pub fn handle_resume_actions(global: &GlobalArgs, args: ResumeActionsArgs) -> ShieldResult<bool> {
    let token = args
        .restore_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ShieldError::Validation("A restore token is required to manage Actions".to_string())
        })?;
    mask_secret(&token);

    let settings = global.settings()?;
    let paths = global.paths(&settings)?;
    let context = GithubContext::from_env()?;

    let api = GithubClient::new(
        &settings.github,
        &settings.api,
        &context.owner,
        &context.repo,
        token.into(),
    )?;
    let mut manager =
        ActionsSuspensionManager::new(&api, paths.suspension_state_file(), context.repository());

    if let Some(owner) = manager.foreign_state_owner() {
        warn!(
            "Suspension state in {} belongs to {}; it is left in place",
            manager.state_file().display(),
            owner
        );
    }
    if manager.has_pending_state() {
        info!(
            "Restoring Actions permissions saved in {}",
            manager.state_file().display()
        );
    } else {
        info!("No saved suspension state, enabling Actions with default permissions");
    }

    match manager.resume() {
        ResumeOutcome::Failed => {
            error!("GitHub Actions could not be re-enabled for {}", context.repository());
            Ok(false)
        }
        outcome => {
            info!("GitHub Actions enabled for {} ({:?})", context.repository(), outcome);
            Ok(true)
        }
    }
}
