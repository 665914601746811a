//! Core types, configuration, and error handling for critic.
//!
//! - [`CriticError`] — unified error type using `thiserror`
//! - [`CriticConfig`] — configuration from `.critic.toml` and the environment
//! - [`TriggerEvent`] — the pull request that caused the run

mod config;
mod error;
mod event;

pub use config::{
    CriticConfig, DiffFailurePolicy, GitHubConfig, LlmConfig, LlmProvider, ReviewConfig,
    CONFIG_PATH_ENV, DEFAULT_BANNER, DEFAULT_CONFIG_FILE,
};
pub use error::CriticError;
pub use event::{split_full_name, TriggerEvent, EVENT_PATH_ENV};

/// A convenience `Result` type for critic operations.
pub type Result<T> = std::result::Result<T, CriticError>;
