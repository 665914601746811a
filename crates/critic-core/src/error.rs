use std::path::PathBuf;

/// Errors that can occur during a review run.
///
/// Each variant wraps one external concern. Library crates return this type
/// directly; the binary renders it as a [`miette`] report at the boundary.
///
/// # Examples
///
/// ```
/// use critic_core::CriticError;
///
/// let err = CriticError::Config("GITHUB_TOKEN not set".into());
/// assert!(err.to_string().contains("GITHUB_TOKEN"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CriticError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(critic::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration, including absent environment variables.
    #[error("configuration error: {0}")]
    #[diagnostic(code(critic::config))]
    Config(String),

    /// The trigger event document could not be read or lacks a required field.
    #[error("invalid event document {}: {message}", .path.display())]
    #[diagnostic(
        code(critic::event),
        help("GITHUB_EVENT_PATH must point at a pull_request event payload")
    )]
    Event {
        /// Path the document was read from.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Version-control subprocess failure.
    #[error("git error: {0}")]
    #[diagnostic(code(critic::git))]
    Git(String),

    /// Generative backend request or response error.
    #[error("LLM error: {0}")]
    #[diagnostic(code(critic::llm))]
    Llm(String),

    /// Code-hosting API error.
    #[error("GitHub error: {0}")]
    #[diagnostic(code(critic::github))]
    GitHub(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(critic::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(critic::toml))]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CriticError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = CriticError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn event_error_shows_path() {
        let err = CriticError::Event {
            path: PathBuf::from("/tmp/event.json"),
            message: "missing field `number`".into(),
        };
        let text = err.to_string();
        assert!(text.contains("/tmp/event.json"));
        assert!(text.contains("number"));
    }

    #[test]
    fn diagnostic_codes_are_namespaced() {
        use miette::Diagnostic;

        let err = CriticError::Llm("quota exceeded".into());
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("critic::llm"));
    }
}
