use async_trait::async_trait;
use critic_core::{split_full_name, CriticError, GitHubConfig};

use crate::runner::{CommentSink, PostedComment};

/// GitHub client that posts the review as an issue comment on the pull request.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
}

impl GitHubClient {
    /// Create a client from the configured token and optional API base.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if no token is available or the API
    /// URL is invalid, or [`CriticError::GitHub`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use critic_core::GitHubConfig;
    /// use critic_review::github::GitHubClient;
    ///
    /// let config = GitHubConfig {
    ///     token: Some("ghp_xxxx".into()),
    ///     api_url: None,
    /// };
    /// let client = GitHubClient::new(&config).unwrap();
    /// ```
    pub fn new(config: &GitHubConfig) -> Result<Self, CriticError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CriticError::Config(
                    "GITHUB_TOKEN not set. Export it or add token under [github] in .critic.toml"
                        .into(),
                )
            })?;

        let mut builder = octocrab::Octocrab::builder().personal_token(token);
        if let Some(api_url) = &config.api_url {
            builder = builder
                .base_uri(api_url.trim_end_matches('/'))
                .map_err(|e| CriticError::Config(format!("invalid GitHub API URL '{api_url}': {e}")))?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| CriticError::GitHub(format!("failed to create GitHub client: {e}")))?;

        Ok(Self { octocrab })
    }

    /// Create an issue comment on pull request `number` of `owner/repo`.
    ///
    /// The repository and pull request are fetched first so that a wrong
    /// name or number fails with the lookup that caused it.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::GitHub`] on any API error.
    pub async fn create_pr_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<PostedComment, CriticError> {
        let repo_route = format!("/repos/{owner}/{repo}");
        let _repository: serde_json::Value = self
            .octocrab
            .get(&repo_route, None::<&()>)
            .await
            .map_err(|e| CriticError::GitHub(format!("repository {owner}/{repo} lookup failed: {e}")))?;

        let pull_route = format!("{repo_route}/pulls/{number}");
        let _pull: serde_json::Value = self
            .octocrab
            .get(&pull_route, None::<&()>)
            .await
            .map_err(|e| {
                CriticError::GitHub(format!("pull request {owner}/{repo}#{number} lookup failed: {e}"))
            })?;

        let comment_route = format!("{repo_route}/issues/{number}/comments");
        let payload = serde_json::json!({ "body": body });
        let created: serde_json::Value = self
            .octocrab
            .post(&comment_route, Some(&payload))
            .await
            .map_err(|e| {
                CriticError::GitHub(format!("failed to comment on {owner}/{repo}#{number}: {e}"))
            })?;

        Ok(PostedComment {
            id: created.get("id").and_then(|v| v.as_u64()),
            html_url: created
                .get("html_url")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

#[async_trait]
impl CommentSink for GitHubClient {
    async fn post_comment(
        &self,
        repo_full_name: &str,
        number: u64,
        body: &str,
    ) -> Result<PostedComment, CriticError> {
        let (owner, repo) = split_full_name(repo_full_name)?;
        self.create_pr_comment(owner, repo, number, body).await
    }
}
