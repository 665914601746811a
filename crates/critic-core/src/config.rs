use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CriticError;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CRITIC_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = ".critic.toml";

/// Top-level configuration.
///
/// Resolution order: environment variables > config file > defaults.
///
/// # Examples
///
/// ```
/// use critic_core::{CriticConfig, DiffFailurePolicy, LlmProvider};
///
/// let config = CriticConfig::default();
/// assert_eq!(config.llm.provider, LlmProvider::Gemini);
/// assert_eq!(config.llm.model(), "gemini-1.5-flash");
/// assert_eq!(config.review.on_diff_failure, DiffFailurePolicy::Ignore);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticConfig {
    /// Generative backend settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Code-hosting API settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

impl CriticConfig {
    /// Load configuration the way the binary does.
    ///
    /// Reads `$CRITIC_CONFIG` if set, else `.critic.toml` if it exists, else
    /// defaults; then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if an explicitly named file cannot be
    /// read, or [`CriticError::Toml`] if a config file is not valid TOML.
    pub fn load() -> Result<Self, CriticError> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] naming `path` if the file cannot be
    /// read, or [`CriticError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, CriticError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CriticError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::{CriticConfig, LlmProvider};
    ///
    /// let toml = r#"
    /// [llm]
    /// provider = "openai"
    /// model = "gpt-4o-mini"
    /// "#;
    /// let config = CriticConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.llm.provider, LlmProvider::OpenAi);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CriticError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay values from the environment, looked up through `lookup`.
    ///
    /// Credentials come from the provider's key variable and `GITHUB_TOKEN`;
    /// the API base from `GITHUB_API_URL`. Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(self.llm.provider.api_key_env()) {
            self.llm.api_key = Some(key);
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_url = Some(url);
        }
        self
    }
}

/// Which generative backend answers the review request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini `generateContent` API.
    #[default]
    Gemini,
    /// Any OpenAI-compatible `/v1/chat/completions` endpoint.
    #[serde(rename = "openai")]
    OpenAi,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::LlmProvider;
    ///
    /// assert_eq!(LlmProvider::Gemini.api_key_env(), "GEMINI_API_KEY");
    /// ```
    pub fn api_key_env(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Model used when none is configured.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::LlmProvider;
    ///
    /// assert_eq!(LlmProvider::OpenAi.default_model(), "gpt-4o-mini");
    /// ```
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini-1.5-flash",
            LlmProvider::OpenAi => "gpt-4o-mini",
        }
    }

    /// Base URL used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
            LlmProvider::OpenAi => "https://api.openai.com",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Generative backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider (default: `"gemini"`).
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model identifier. Unset means the provider's default, see [`LlmConfig::model`].
    pub model: Option<String>,
    /// API key; normally supplied through the environment.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
    /// Request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// The configured model, or the provider's default.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The configured base URL, or the provider's default, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }
}

/// What to do when `git diff` exits with a failure status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffFailurePolicy {
    /// Use whatever stdout holds, possibly nothing.
    #[default]
    Ignore,
    /// Abort the run with the subprocess's stderr.
    Error,
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use critic_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert!(config.banner.ends_with("\n\n"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Prefix of every posted comment.
    #[serde(default = "default_banner")]
    pub banner: String,
    /// Handling of a failed diff subprocess.
    #[serde(default)]
    pub on_diff_failure: DiffFailurePolicy,
}

/// Banner placed before the review text in the posted comment.
pub const DEFAULT_BANNER: &str = "\u{1f916} **Gemini 코드 리뷰 결과**\n\n";

fn default_banner() -> String {
    DEFAULT_BANNER.into()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            banner: default_banner(),
            on_diff_failure: DiffFailurePolicy::default(),
        }
    }
}

/// Code-hosting API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API token; normally supplied through `GITHUB_TOKEN`.
    pub token: Option<String>,
    /// API base URL (default: `https://api.github.com`).
    pub api_url: Option<String>,
}
