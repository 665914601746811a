//! Pull-request review pipeline.
//!
//! Provides the diff source, the generative backend client, prompt
//! construction, the GitHub comment client, and the [`runner`] that ties
//! them together.

pub mod git;
pub mod github;
pub mod llm;
pub mod prompt;
pub mod runner;
