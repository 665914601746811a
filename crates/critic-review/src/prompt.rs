const REVIEW_INSTRUCTIONS: &str = "\
Provide:
- Potential bugs
- Performance issues
- Security risks
- Readability improvements
- Testing considerations

Respond in Markdown with clear bullet points.";

/// Build the review request embedding `diff` verbatim.
///
/// # Examples
///
/// ```
/// use critic_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("+new line");
/// assert!(prompt.contains("```diff\n+new line\n```"));
/// ```
pub fn build_review_prompt(diff: &str) -> String {
    format!(
        "You are a senior backend engineer doing a code review.\n\
         Review the following git diff:\n\n\
         ```diff\n{diff}\n```\n\n\
         {REVIEW_INSTRUCTIONS}"
    )
}

/// Comment body posted to the pull request: the banner, then the review untouched.
///
/// # Examples
///
/// ```
/// use critic_review::prompt::compose_comment;
///
/// assert_eq!(compose_comment("## Bot\n\n", "- looks fine"), "## Bot\n\n- looks fine");
/// ```
pub fn compose_comment(banner: &str, review: &str) -> String {
    let mut body = String::with_capacity(banner.len() + review.len());
    body.push_str(banner);
    body.push_str(review);
    body
}
