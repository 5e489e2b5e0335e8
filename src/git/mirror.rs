//! Mirror clones, history filtering and push strategies

use std::path::Path;

use tracing::{debug, info, warn};

use super::capability::FilterCapability;
use super::command::{redact_url, GitCommand};
use super::{CommitInfo, GitOperations};
use crate::config::AppConfig;
use crate::error::{ShieldError, ShieldResult};

const WORKFLOW_DIR: &str = ".github/workflows";

const COMMIT_FORMAT: &str = "--pretty=%H|%h|%P|%an <%ae>|%ad|%cn|%s%n%b";

const TOKEN_SETUP_GUIDE: &str = "https://github.com/marketplace/actions/icredible-git-security#-personal-access-token-pat-setup-guide-for-repository-restore";

/// git operations backed by the `git` binary
#[derive(Debug, Clone)]
pub struct GitMirror {
    capability: FilterCapability,
}

impl GitMirror {
    /// Verify git is installed and remember the filter capability
    pub fn initialize(capability: FilterCapability) -> ShieldResult<Self> {
        GitCommand::new(["--version"])
            .run()
            .map_err(|_| ShieldError::git("git --version", "git is not available in the environment"))?;

        debug!("Filter capability: {:?}", capability);
        Ok(Self { capability })
    }

    pub fn capability(&self) -> FilterCapability {
        self.capability
    }

    /// Set the commit identity for a repository
    pub fn configure_git(&self, repo: &Path, user_name: &str, user_email: &str) -> ShieldResult<()> {
        info!("Configuring git user: {} <{}>", user_name, user_email);
        GitCommand::new(["config", "user.name", user_name])
            .current_dir(repo)
            .run()?;
        GitCommand::new(["config", "user.email", user_email])
            .current_dir(repo)
            .run()?;
        Ok(())
    }

    /// Force-push every ref at once (default token)
    ///
    /// The default token cannot write workflow files, so history must have
    /// been filtered first.
    pub fn push_mirror(&self, repo: &Path, remote_url: &str) -> ShieldResult<()> {
        info!("Pushing mirror to remote repository (default token)");
        GitCommand::new(["push", "--mirror", "--force", remote_url])
            .current_dir(repo)
            .run()?;

        warn!(
            "The repository was restored without the {} directory. To restore it as well, \
             supply a restore token: {}",
            WORKFLOW_DIR, TOKEN_SETUP_GUIDE
        );
        Ok(())
    }

    /// Force-push each local branch, then all tags (elevated token)
    pub fn push_all_branches(&self, repo: &Path, remote_url: &str) -> ShieldResult<()> {
        info!("Pushing all branches and tags individually (restore token)");

        let output = GitCommand::new(["for-each-ref", "--format=%(refname:short)", "refs/heads/"])
            .current_dir(repo)
            .run()?;

        for branch in output.lines().map(str::trim).filter(|b| !b.is_empty()) {
            info!("Pushing branch: {}", branch);
            GitCommand::new(["push", remote_url, branch, "--force"])
                .current_dir(repo)
                .run()?;
        }

        info!("Pushing all tags");
        GitCommand::new(["push", remote_url, "--tags", "--force"])
            .current_dir(repo)
            .run()?;

        info!("All branches and tags pushed successfully");
        Ok(())
    }

    /// Whether `HEAD` resolves to a commit
    pub fn has_commits(&self, repo: &Path) -> bool {
        GitCommand::new(["rev-parse", "--verify", "HEAD"])
            .current_dir(repo)
            .succeeds()
    }

    /// Name of the checked-out branch
    pub fn current_branch(&self, repo: &Path) -> ShieldResult<String> {
        GitCommand::new(["rev-parse", "--abbrev-ref", "HEAD"])
            .current_dir(repo)
            .run()
    }

    fn filter_with_filter_repo(&self, repo: &Path) -> ShieldResult<()> {
        info!("Filtering out {} using git-filter-repo", WORKFLOW_DIR);
        GitCommand::new(["filter-repo", "--force", "--path", WORKFLOW_DIR, "--invert-paths"])
            .current_dir(repo)
            .run()?;
        info!("Workflow directory filtering completed with git-filter-repo");
        Ok(())
    }

    fn filter_with_filter_branch(&self, repo: &Path) -> ShieldResult<()> {
        info!("Filtering out {} using git filter-branch", WORKFLOW_DIR);
        let index_filter = format!("git rm -rf --cached --ignore-unmatch {}", WORKFLOW_DIR);

        GitCommand::new([
            "filter-branch",
            "--force",
            "--index-filter",
            index_filter.as_str(),
            "--prune-empty",
            "--tag-name-filter",
            "cat",
            "--",
            "--all",
        ])
        .current_dir(repo)
        .env("FILTER_BRANCH_SQUELCH_WARNING", "1")
        .run()
        .and_then(|_| self.drop_original_refs(repo))
        .map_err(|e| match e {
            ShieldError::Git { command, message } => ShieldError::git(
                command,
                format!(
                    "failed to remove {} from history, refusing to push: {}",
                    WORKFLOW_DIR, message
                ),
            ),
            other => other,
        })?;

        info!("Workflow directory filtering completed with git filter-branch");
        Ok(())
    }

    /// Delete the `refs/original/*` backups filter-branch leaves behind
    ///
    /// They still point at the unfiltered history and a mirror push would
    /// send them along.
    fn drop_original_refs(&self, repo: &Path) -> ShieldResult<()> {
        let refs = GitCommand::new(["for-each-ref", "--format=%(refname)", "refs/original/"])
            .current_dir(repo)
            .run()?;

        for name in refs.lines().map(str::trim).filter(|name| !name.is_empty()) {
            debug!("Deleting backup ref {}", name);
            GitCommand::new(["update-ref", "-d", name])
                .current_dir(repo)
                .run()?;
        }

        let housekeeping: [&[&str]; 2] = [
            &["reflog", "expire", "--expire=now", "--all"],
            &["gc", "--prune=now", "--quiet"],
        ];
        for args in housekeeping {
            let command = GitCommand::new(args.iter().copied()).current_dir(repo);
            if let Err(e) = command.run() {
                warn!("`{}` failed after filtering: {}", command.display(), e);
            }
        }
        Ok(())
    }
}

impl GitOperations for GitMirror {
    fn create_mirror_clone(&self, source: &Path, target: &Path) -> ShieldResult<()> {
        info!(
            "Creating mirror clone from {} to {}",
            source.display(),
            target.display()
        );

        let source = source.to_string_lossy();
        let target = target.to_string_lossy();
        GitCommand::new(["clone", "--mirror", &*source, &*target]).run()?;

        info!("Mirror clone created successfully");
        Ok(())
    }

    fn current_commit_info(&self, repo: &Path) -> ShieldResult<CommitInfo> {
        if !self.has_commits(repo) {
            warn!("No commits found in repository");
            return Ok(CommitInfo::default());
        }

        let output = GitCommand::new(["log", "-1", COMMIT_FORMAT])
            .current_dir(repo)
            .run()?;

        let info = CommitInfo::parse(&output);
        debug!("Retrieved commit info: {}", info.short_hash);
        Ok(info)
    }

    fn sync_remote_branches(&self, repo: &Path) -> ShieldResult<()> {
        info!("Syncing remote branches as local branches");

        let output = GitCommand::new(["branch", "-r"]).current_dir(repo).run()?;
        let checked_out = self.current_branch(repo).ok();

        for branch in remote_branch_names(&output) {
            if checked_out.as_deref() == Some(branch) {
                debug!("Skipping checked-out branch {}", branch);
                continue;
            }
            debug!("Creating local branch: {}", branch);
            let upstream = format!("origin/{}", branch);
            let result = GitCommand::new(["branch", branch, upstream.as_str()])
                .current_dir(repo)
                .run();
            if let Err(e) = result {
                warn!("Could not create local branch {}: {}", branch, e);
            }
        }

        info!("Remote branch sync completed");
        Ok(())
    }

    fn filter_workflow_directory(&self, repo: &Path) -> ShieldResult<()> {
        if self.capability == FilterCapability::ModernFilterAvailable {
            match self.filter_with_filter_repo(repo) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("git-filter-repo failed: {}. Falling back to git filter-branch.", e),
            }
        }

        self.filter_with_filter_branch(repo)
    }

    fn configure_and_push(
        &self,
        repo: &Path,
        config: &AppConfig,
        has_elevated_token: bool,
    ) -> ShieldResult<()> {
        self.configure_git(repo, &config.settings.git.user_name, &config.settings.git.user_email)?;

        let candidate = if has_elevated_token {
            config.inputs.restore_token.as_ref()
        } else {
            config.inputs.github_token.as_ref()
        };
        let token = candidate
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ShieldError::Config("No GitHub token available for pushing".to_string())
            })?;

        let remote_url = push_url(
            &config.settings.github.host,
            &config.context.owner,
            &config.context.repo,
            token,
        );
        debug!("Push target: {}", redact_url(&remote_url));

        if has_elevated_token {
            self.push_all_branches(repo, &remote_url)
        } else {
            self.push_mirror(repo, &remote_url)
        }
    }
}

/// Authenticated HTTPS push URL
pub fn push_url(host: &str, owner: &str, repo: &str, token: &str) -> String {
    format!("https://x-access-token:{}@{}/{}/{}.git", token, host, owner, repo)
}

/// Branch names from `git branch -r`, minus symbolic refs and `HEAD`
fn remote_branch_names(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains("->"))
        .map(|line| line.strip_prefix("origin/").unwrap_or(line))
        .filter(|branch| *branch != "HEAD")
        .collect()
}
