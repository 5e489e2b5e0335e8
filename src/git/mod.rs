//! git integration
//!
//! The workflows only see the [`GitOperations`] trait; [`GitMirror`]
//! implements it by shelling out to the `git` binary.

pub mod capability;
pub mod command;
pub mod mirror;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ShieldResult;

pub use capability::FilterCapability;
pub use command::redact_url;
pub use mirror::{push_url, GitMirror};

/// Details of the newest commit
///
/// All fields empty means the repository has no commits yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub short_hash: String,
    /// Space-separated parent hashes
    pub parents: String,
    /// `Name <email>`
    pub author: String,
    pub date: String,
    /// Subject, followed by the body on later lines when there is one
    pub message: String,
}

impl CommitInfo {
    /// Parse `git log -1 --pretty=%H|%h|%P|%an <%ae>|%ad|%cn|%s%n%b` output
    pub fn parse(output: &str) -> Self {
        let mut lines = output.trim().splitn(2, '\n');
        let header = lines.next().unwrap_or_default();
        let body = lines.next().unwrap_or_default().trim();

        let mut fields = header.splitn(7, '|');
        let mut next = || fields.next().unwrap_or_default().to_string();

        let hash = next();
        let short_hash = next();
        let parents = next();
        let author = next();
        let date = next();
        let _committer = next();
        let subject = next();

        let message = match (subject.is_empty(), body.is_empty()) {
            (true, _) => String::new(),
            (false, true) => subject,
            (false, false) => format!("{}\n{}", subject, body),
        };

        Self {
            hash,
            short_hash,
            parents,
            author,
            date,
            message,
        }
    }

    /// Whether this describes an empty repository
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }
}

/// git operations the backup and restore workflows depend on
pub trait GitOperations {
    /// `git clone --mirror source target`
    fn create_mirror_clone(&self, source: &Path, target: &Path) -> ShieldResult<()>;

    /// Newest commit, or an empty [`CommitInfo`] when there are no commits
    fn current_commit_info(&self, repo: &Path) -> ShieldResult<CommitInfo>;

    /// Create a local branch for every `origin/*` branch
    fn sync_remote_branches(&self, repo: &Path) -> ShieldResult<()>;

    /// Rewrite history without `.github/workflows`
    fn filter_workflow_directory(&self, repo: &Path) -> ShieldResult<()>;

    /// Configure the commit identity and push the repository back to GitHub
    fn configure_and_push(
        &self,
        repo: &Path,
        config: &AppConfig,
        has_elevated_token: bool,
    ) -> ShieldResult<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::fs;

    use super::*;
    use crate::error::ShieldError;

    /// Records calls in order and touches the filesystem only where the
    /// workflows depend on it
    #[derive(Default)]
    pub struct FakeGit {
        pub calls: RefCell<Vec<String>>,
        pub commit: CommitInfo,
        pub fail_push: bool,
    }

    impl FakeGit {
        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: &str) {
            self.calls.borrow_mut().push(call.to_string());
        }

        fn require_repo(&self, repo: &Path) -> ShieldResult<()> {
            if repo.join("HEAD").is_file() {
                Ok(())
            } else {
                Err(ShieldError::git("git branch -r", "not a git repository"))
            }
        }
    }

    impl GitOperations for FakeGit {
        fn create_mirror_clone(&self, _source: &Path, target: &Path) -> ShieldResult<()> {
            self.record("clone");
            fs::create_dir_all(target.join("refs"))?;
            fs::write(target.join("HEAD"), "ref: refs/heads/main\n")?;
            fs::write(target.join("packed-refs"), "# pack-refs with: peeled\n")?;
            Ok(())
        }

        fn current_commit_info(&self, _repo: &Path) -> ShieldResult<CommitInfo> {
            self.record("commit_info");
            Ok(self.commit.clone())
        }

        fn sync_remote_branches(&self, repo: &Path) -> ShieldResult<()> {
            self.record("sync");
            self.require_repo(repo)
        }

        fn filter_workflow_directory(&self, repo: &Path) -> ShieldResult<()> {
            self.record("filter");
            self.require_repo(repo)
        }

        fn configure_and_push(
            &self,
            repo: &Path,
            _config: &AppConfig,
            has_elevated_token: bool,
        ) -> ShieldResult<()> {
            self.record(if has_elevated_token { "push:elevated" } else { "push:default" });
            self.require_repo(repo)?;
            if self.fail_push {
                return Err(ShieldError::git("git push --mirror --force", "remote rejected"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commit_with_body() {
        let output = "0123456789abcdef|0123456|aaaa bbbb|Jane Doe <jane@example.com>|Tue Mar 4 10:00:00 2025 +0000|Jane Doe|Merge branch 'x'\n\nLonger description\nsecond line\n";
        let info = CommitInfo::parse(output);

        assert_eq!(info.hash, "0123456789abcdef");
        assert_eq!(info.short_hash, "0123456");
        assert_eq!(info.parents, "aaaa bbbb");
        assert_eq!(info.author, "Jane Doe <jane@example.com>");
        assert_eq!(info.date, "Tue Mar 4 10:00:00 2025 +0000");
        assert_eq!(info.message, "Merge branch 'x'\nLonger description\nsecond line");
    }

    #[test]
    fn test_parse_subject_with_pipes() {
        let info = CommitInfo::parse("abc|ab||A <a@b>|date|A|fix: a | b | c");
        assert_eq!(info.message, "fix: a | b | c");
        assert!(info.parents.is_empty());
    }

    #[test]
    fn test_parse_empty_output() {
        let info = CommitInfo::parse("");
        assert_eq!(info, CommitInfo::default());
        assert!(info.is_empty());
    }
}
