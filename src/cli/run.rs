//! `backup`, `restore` and `run` commands

use clap::{ArgAction, Args};
use tracing::{error, info, warn};

use super::GlobalArgs;
use crate::config::{Action, ActionInputs, AppConfig, GithubContext, OtpMethod};
use crate::crypto::SecureString;
use crate::error::{ShieldError, ShieldResult};
use crate::git::{FilterCapability, GitMirror};
use crate::github::{ActionsApi, GithubClient};
use crate::logging::mask_secret;
use crate::remote::HttpBackupClient;
use crate::workflow::{BackupWorkflow, RestoreWorkflow};

/// Inputs for a backup or restore
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Activation code of the vault endpoint
    #[arg(long, env = "INPUT_ICREDIBLE_ACTIVATION_CODE", hide_env_values = true)]
    pub activation_code: Option<String>,

    /// Encryption password (prompted for when omitted)
    #[arg(long, env = "INPUT_ICREDIBLE_ENCRYPTION_PASSWORD", hide_env_values = true)]
    pub encryption_password: Option<String>,

    /// Backup version to restore
    #[arg(long, env = "INPUT_FILE_VERSION_ID")]
    pub file_version_id: Option<String>,

    /// Token able to push workflow files and manage Actions
    #[arg(long, env = "INPUT_ICREDIBLE_REPOSITORY_RESTORE_TOKEN", hide_env_values = true)]
    pub restore_token: Option<String>,

    /// Default job token
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Suspend GitHub Actions while the restore pushes
    #[arg(
        long,
        env = "INPUT_SUSPEND_ACTIONS",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub suspend_actions: bool,

    /// How the OTP is delivered (MAIL or AUTHENTICATOR)
    #[arg(long, env = "INPUT_OTP_DELIVERY_METHOD", default_value = "MAIL")]
    pub otp_delivery_method: OtpMethod,
}

impl RunArgs {
    /// Turn the arguments into run inputs, prompting for a missing password
    pub fn into_inputs(self, action: Action) -> ShieldResult<ActionInputs> {
        let encryption_password = match self.encryption_password {
            Some(password) => password,
            None => prompt_password("Encryption password: ")?,
        };

        let github_token = self
            .github_token
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.is_empty());

        Ok(ActionInputs {
            activation_code: self.activation_code.unwrap_or_default().into(),
            encryption_password: encryption_password.into(),
            action,
            file_version_id: self.file_version_id.filter(|id| !id.is_empty()),
            restore_token: self
                .restore_token
                .filter(|token| !token.is_empty())
                .map(SecureString::from),
            github_token: github_token.map(SecureString::from),
            suspend_actions: self.suspend_actions,
            otp_method: self.otp_delivery_method,
        })
    }
}

/// Prompt for a password (hidden input)
fn prompt_password(prompt: &str) -> ShieldResult<String> {
    rpassword::prompt_password(prompt)
        .map_err(|e| ShieldError::Validation(format!("Failed to read password: {}", e)))
}

/// Validate inputs, build the clients and run one workflow
///
/// Returns whether the workflow succeeded.
pub fn handle_run(global: &GlobalArgs, action: Action, args: RunArgs) -> ShieldResult<bool> {
    let inputs = args.into_inputs(action)?;
    inputs.validate()?;
    for secret in inputs.secrets() {
        mask_secret(secret);
    }

    let settings = global.settings()?;
    let paths = global.paths(&settings)?;
    let context = GithubContext::from_env()?;

    let default_token = inputs.github_token.clone().ok_or_else(|| {
        ShieldError::Validation("Input 'github-token' is required".to_string())
    })?;
    let repository_api = GithubClient::new(
        &settings.github,
        &settings.api,
        &context.owner,
        &context.repo,
        default_token,
    )?;

    let config = AppConfig {
        inputs,
        settings,
        context,
        paths,
    };

    let remote = HttpBackupClient::new(
        &config.settings.api,
        &config.settings.endpoint_type,
        &repository_api,
        &config.context,
    )?;

    info!("Running {} for {}", config.inputs.action, config.context.repository());

    match config.inputs.action {
        Action::Backup => {
            let git = GitMirror::initialize(FilterCapability::LegacyOnly)?;
            let outcome = BackupWorkflow::new(&config, &git, &remote).execute();
            report(outcome.success, &outcome.summary());
            Ok(outcome.success)
        }
        Action::Restore => {
            let git = GitMirror::initialize(FilterCapability::probe())?;
            if git.capability() == FilterCapability::LegacyOnly {
                info!("git-filter-repo unavailable, history filtering will use git filter-branch");
            }

            let actions_api = match &config.inputs.restore_token {
                Some(token) if !token.is_empty() => Some(GithubClient::new(
                    &config.settings.github,
                    &config.settings.api,
                    &config.context.owner,
                    &config.context.repo,
                    token.clone(),
                )?),
                _ => None,
            };
            if actions_api.is_none() && config.inputs.suspend_actions {
                warn!("No restore token supplied, GitHub Actions cannot be suspended during restore");
            }

            let outcome = RestoreWorkflow::new(
                &config,
                &git,
                &remote,
                actions_api.as_ref().map(|api| api as &dyn ActionsApi),
            )
            .execute();
            report(outcome.success, &outcome.summary());
            Ok(outcome.success)
        }
    }
}

fn report(success: bool, summary: &str) {
    if success {
        info!("{}", summary);
    } else {
        error!("{}", summary);
    }
}
