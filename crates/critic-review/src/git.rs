use std::path::PathBuf;

use async_trait::async_trait;
use critic_core::{CriticError, DiffFailurePolicy};
use tokio::process::Command;

use crate::runner::DiffSource;

/// Computes diffs by running the `git` binary in a local clone.
///
/// # Examples
///
/// ```
/// use critic_core::DiffFailurePolicy;
/// use critic_review::git::GitCli;
///
/// let git = GitCli::new(".", DiffFailurePolicy::Ignore);
/// assert_eq!(git.range("aaa", "bbb"), "aaa...bbb");
/// ```
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
    policy: DiffFailurePolicy,
}

impl GitCli {
    /// Create a diff source rooted at `repo_dir`.
    pub fn new(repo_dir: impl Into<PathBuf>, policy: DiffFailurePolicy) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            policy,
        }
    }

    /// The revision range passed to `git diff`: changes on `head` since its
    /// merge base with `base`.
    pub fn range(&self, base: &str, head: &str) -> String {
        format!("{base}...{head}")
    }
}

#[async_trait]
impl DiffSource for GitCli {
    async fn diff(&self, base: &str, head: &str) -> Result<String, CriticError> {
        let range = self.range(base, head);
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_dir)
            .args(["diff", "--end-of-options", range.as_str()])
            .output()
            .await
            .map_err(|e| CriticError::Git(format!("failed to run git diff {range}: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            match self.policy {
                DiffFailurePolicy::Error => {
                    return Err(CriticError::Git(format!(
                        "git diff {range} failed ({}): {}",
                        output.status,
                        stderr.trim()
                    )));
                }
                DiffFailurePolicy::Ignore => {
                    log::debug!("git diff {range} exited with {}; using stdout as-is", output.status);
                }
            }
        }
        if !stderr.trim().is_empty() {
            log::debug!("git diff stderr: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["-c", "user.name=critic", "-c", "user.email=critic@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// A repository with two commits; returns `(dir, first_sha, second_sha)`.
    fn two_commit_repo() -> (tempfile::TempDir, String, String) {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        std::fs::write(dir.path().join("lib.rs"), "fn a() {}\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "first"]);
        let first = git(dir.path(), &["rev-parse", "HEAD"]);

        std::fs::write(dir.path().join("lib.rs"), "fn a() {}\nfn b() {}\n").unwrap();
        git(dir.path(), &["commit", "-q", "-am", "second"]);
        let second = git(dir.path(), &["rev-parse", "HEAD"]);
        (dir, first, second)
    }

    #[tokio::test]
    async fn diff_between_commits_is_trimmed_text() {
        let (dir, first, second) = two_commit_repo();
        let source = GitCli::new(dir.path(), DiffFailurePolicy::Ignore);

        let diff = source.diff(&first, &second).await.unwrap();
        assert!(diff.starts_with("diff --git a/lib.rs b/lib.rs"));
        assert!(diff.contains("+fn b() {}"));
        assert!(!diff.ends_with('\n'));
    }

    #[tokio::test]
    async fn same_revision_yields_empty_diff() {
        let (dir, _, second) = two_commit_repo();
        let source = GitCli::new(dir.path(), DiffFailurePolicy::Ignore);

        let diff = source.diff(&second, &second).await.unwrap();
        assert!(diff.is_empty());
    }

    #[tokio::test]
    async fn unknown_revision_is_empty_when_ignored() {
        let (dir, first, _) = two_commit_repo();
        let source = GitCli::new(dir.path(), DiffFailurePolicy::Ignore);

        let diff = source.diff(&first, "deadbeefdeadbeef").await.unwrap();
        assert!(diff.is_empty());
    }

    #[tokio::test]
    async fn option_like_revision_is_not_parsed_as_a_flag() {
        let (dir, first, _) = two_commit_repo();
        let out = dir.path().join("written-by-git");
        let source = GitCli::new(dir.path(), DiffFailurePolicy::Error);

        let base = format!("--output={}", out.display());
        let err = source.diff(&base, &first).await.unwrap_err();

        assert!(matches!(err, CriticError::Git(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn unknown_revision_is_an_error_when_strict() {
        let (dir, first, _) = two_commit_repo();
        let source = GitCli::new(dir.path(), DiffFailurePolicy::Error);

        let err = source.diff(&first, "deadbeefdeadbeef").await.unwrap_err();
        assert!(matches!(err, CriticError::Git(_)));
        assert!(err.to_string().contains("deadbeefdeadbeef"));
    }
}
