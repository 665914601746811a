//! The review run: event → diff → review → comment.
//!
//! Each external dependency sits behind a trait so the steps can be driven
//! with fakes. The backend and comment clients are only built once a
//! non-empty diff exists, so an empty diff needs no credentials.

use async_trait::async_trait;
use critic_core::{CriticError, TriggerEvent};

use crate::prompt;

/// Produces the textual diff between two revisions.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Diff from `base` to `head`, trimmed.
    async fn diff(&self, base: &str, head: &str) -> Result<String, CriticError>;
}

/// Answers a review prompt with free-form text.
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Return the backend's response to `prompt` verbatim.
    async fn review(&self, prompt: &str) -> Result<String, CriticError>;
}

/// Publishes a comment on a pull request.
#[async_trait]
pub trait CommentSink: Send + Sync {
    /// Create a new comment with `body` on pull request `number` of `repo_full_name`.
    async fn post_comment(
        &self,
        repo_full_name: &str,
        number: u64,
        body: &str,
    ) -> Result<PostedComment, CriticError>;
}

/// What the code host reported about a created comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedComment {
    /// Comment id, when returned.
    pub id: Option<u64>,
    /// Browser URL of the comment, when returned.
    pub html_url: Option<String>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The diff was empty; nothing was sent or posted.
    NoDiff,
    /// The review was posted.
    Posted(PostedComment),
}

/// Compute the diff for `event`, or `None` when there is nothing to review.
///
/// # Errors
///
/// Propagates the [`DiffSource`] error.
pub async fn compute_diff<D>(source: &D, event: &TriggerEvent) -> Result<Option<String>, CriticError>
where
    D: DiffSource + ?Sized,
{
    let diff = source.diff(&event.base_sha, &event.head_sha).await?;
    let diff = diff.trim();
    if diff.is_empty() {
        return Ok(None);
    }
    log::info!(
        "diff {}...{}: {} lines, {} bytes",
        event.base_sha,
        event.head_sha,
        diff.lines().count(),
        diff.len()
    );
    Ok(Some(diff.to_string()))
}

/// Ask `model` to review `diff`.
///
/// # Errors
///
/// Propagates the [`ReviewModel`] error.
pub async fn request_review<M>(model: &M, diff: &str) -> Result<String, CriticError>
where
    M: ReviewModel + ?Sized,
{
    let prompt = prompt::build_review_prompt(diff);
    model.review(&prompt).await
}

/// Post `banner` followed by `review` on the event's pull request.
///
/// # Errors
///
/// Propagates the [`CommentSink`] error.
pub async fn post_review<C>(
    sink: &C,
    event: &TriggerEvent,
    banner: &str,
    review: &str,
) -> Result<PostedComment, CriticError>
where
    C: CommentSink + ?Sized,
{
    let body = prompt::compose_comment(banner, review);
    sink.post_comment(&event.repo_full_name, event.number, &body)
        .await
}

/// Run the whole review for `event`.
///
/// `connect` builds the backend and comment clients; it is called only when
/// the diff is non-empty, and at most once.
///
/// # Errors
///
/// Returns the first error from any step; nothing is retried.
pub async fn run<D, M, C, F>(
    event: &TriggerEvent,
    source: &D,
    banner: &str,
    connect: F,
) -> Result<Outcome, CriticError>
where
    D: DiffSource + ?Sized,
    M: ReviewModel,
    C: CommentSink,
    F: FnOnce() -> Result<(M, C), CriticError>,
{
    let Some(diff) = compute_diff(source, event).await? else {
        log::info!("no changes between {} and {}", event.base_sha, event.head_sha);
        return Ok(Outcome::NoDiff);
    };

    let (model, sink) = connect()?;
    let review = request_review(&model, &diff).await?;
    log::info!("received review ({} bytes)", review.len());

    let posted = post_review(&sink, event, banner, &review).await?;
    log::info!(
        "posted comment on {}#{}{}",
        event.repo_full_name,
        event.number,
        posted
            .html_url
            .as_deref()
            .map(|url| format!(": {url}"))
            .unwrap_or_default()
    );
    Ok(Outcome::Posted(posted))
}
