use std::path::Path;

use serde::Deserialize;

use crate::error::CriticError;

/// Environment variable the CI runner sets to the event payload path.
pub const EVENT_PATH_ENV: &str = "GITHUB_EVENT_PATH";

/// The pull request that triggered this run.
///
/// Only the fields the review needs are kept; everything else in the
/// payload is ignored.
///
/// # Examples
///
/// ```
/// use critic_core::TriggerEvent;
///
/// let json = r#"{
///     "number": 42,
///     "repository": {"full_name": "org/repo"},
///     "pull_request": {"base": {"sha": "aaa"}, "head": {"sha": "bbb"}}
/// }"#;
/// let event = TriggerEvent::from_json(json).unwrap();
/// assert_eq!(event.number, 42);
/// assert_eq!(event.repo_full_name, "org/repo");
/// assert_eq!(event.base_sha, "aaa");
/// assert_eq!(event.head_sha, "bbb");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Pull request number.
    pub number: u64,
    /// Owning repository as `owner/repo`.
    pub repo_full_name: String,
    /// Base revision.
    pub base_sha: String,
    /// Head revision.
    pub head_sha: String,
}

#[derive(Deserialize)]
struct RawEvent {
    number: u64,
    repository: RawRepository,
    pull_request: RawPullRequest,
}

#[derive(Deserialize)]
struct RawRepository {
    full_name: String,
}

#[derive(Deserialize)]
struct RawPullRequest {
    base: RawRef,
    head: RawRef,
}

#[derive(Deserialize)]
struct RawRef {
    sha: String,
}

impl From<RawEvent> for TriggerEvent {
    fn from(raw: RawEvent) -> Self {
        Self {
            number: raw.number,
            repo_full_name: raw.repository.full_name,
            base_sha: raw.pull_request.base.sha,
            head_sha: raw.pull_request.head.sha,
        }
    }
}

impl TriggerEvent {
    /// Load the event named by `GITHUB_EVENT_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if the variable is unset, or the
    /// errors of [`TriggerEvent::from_file`].
    pub fn from_env() -> Result<Self, CriticError> {
        let path = std::env::var_os(EVENT_PATH_ENV)
            .ok_or_else(|| CriticError::Config(format!("{EVENT_PATH_ENV} not set")))?;
        Self::from_file(Path::new(&path))
    }

    /// Load the event from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Event`] if the file cannot be read or the
    /// document lacks a required field.
    pub fn from_file(path: &Path) -> Result<Self, CriticError> {
        let content = std::fs::read_to_string(path).map_err(|e| CriticError::Event {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let raw: RawEvent = serde_json::from_str(&content).map_err(|e| CriticError::Event {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(raw.into())
    }

    /// Parse the event from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Serialization`] on malformed JSON or a missing field.
    pub fn from_json(content: &str) -> Result<Self, CriticError> {
        let raw: RawEvent = serde_json::from_str(content)?;
        Ok(raw.into())
    }

    /// Split the repository full name into `(owner, repo)`.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if the name is not `owner/repo`.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::TriggerEvent;
    ///
    /// let event = TriggerEvent {
    ///     number: 1,
    ///     repo_full_name: "octocat/hello-world".into(),
    ///     base_sha: "a".into(),
    ///     head_sha: "b".into(),
    /// };
    /// assert_eq!(event.owner_and_repo().unwrap(), ("octocat", "hello-world"));
    /// ```
    pub fn owner_and_repo(&self) -> Result<(&str, &str), CriticError> {
        split_full_name(&self.repo_full_name)
    }
}

/// Split `owner/repo` into its two halves.
///
/// # Errors
///
/// Returns [`CriticError::Config`] if either half is empty or the separator is missing.
pub fn split_full_name(full_name: &str) -> Result<(&str, &str), CriticError> {
    match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(CriticError::Config(format!(
            "invalid repository name '{full_name}', expected owner/repo"
        ))),
    }
}
