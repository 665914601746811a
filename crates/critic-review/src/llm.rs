use std::time::Duration;

use async_trait::async_trait;
use critic_core::{CriticError, LlmConfig, LlmProvider};

use crate::runner::ReviewModel;

/// Single-shot text generation client.
///
/// Talks to Gemini's `generateContent` endpoint or to any OpenAI-compatible
/// `/v1/chat/completions` endpoint, depending on [`LlmConfig::provider`].
///
/// # Examples
///
/// ```
/// use critic_core::LlmConfig;
/// use critic_review::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gemini-1.5-flash");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl LlmClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if no API key is configured, or
    /// [`CriticError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, CriticError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CriticError::Config(format!(
                    "{} not set. Export it or add api_key under [llm] in .critic.toml",
                    config.provider.api_key_env()
                ))
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| CriticError::Llm(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// Return the configured provider.
    pub fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    /// Send `prompt` as a single request and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Llm`] on transport errors, non-success status,
    /// or a response without text.
    pub async fn generate(&self, prompt: &str) -> Result<String, CriticError> {
        match self.config.provider {
            LlmProvider::Gemini => self.generate_gemini(prompt).await,
            LlmProvider::OpenAi => self.generate_openai(prompt).await,
        }
    }

    async fn generate_gemini(&self, prompt: &str) -> Result<String, CriticError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        );
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ],
        });

        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response_body = self.send(request, &url).await?;
        extract_gemini_text(&response_body)
    }

    async fn generate_openai(&self, prompt: &str) -> Result<String, CriticError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let body = serde_json::json!({
            "model": self.config.model(),
            "messages": [{ "role": "user", "content": prompt }],
        });

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);
        let response_body = self.send(request, &url).await?;
        extract_openai_text(&response_body)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<serde_json::Value, CriticError> {
        log::debug!("POST {url}");
        let response = request
            .send()
            .await
            .map_err(|e| CriticError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(CriticError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CriticError::Llm(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl ReviewModel for LlmClient {
    async fn review(&self, prompt: &str) -> Result<String, CriticError> {
        self.generate(prompt).await
    }
}

/// Concatenate the text parts of the first Gemini candidate.
fn extract_gemini_text(body: &serde_json::Value) -> Result<String, CriticError> {
    let Some(candidate) = body.get("candidates").and_then(|c| c.get(0)) else {
        let reason = body
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(|r| r.as_str());
        return Err(CriticError::Llm(match reason {
            Some(reason) => format!("prompt was blocked: {reason}"),
            None => format!("response has no candidates: {body}"),
        }));
    };

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| CriticError::Llm(format!("unexpected response structure: {body}")))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        return Err(CriticError::Llm(format!("response contains no text: {body}")));
    }
    Ok(text)
}

fn extract_openai_text(body: &serde_json::Value) -> Result<String, CriticError> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| CriticError::Llm(format!("unexpected response structure: {body}")))
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn config(provider: LlmProvider, base_url: String) -> LlmConfig {
        LlmConfig {
            provider,
            model: Some("test-model".into()),
            api_key: Some("secret".into()),
            base_url: Some(base_url),
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn missing_api_key_names_the_variable() {
        let err = LlmClient::new(&LlmConfig::default()).err().unwrap();
        assert!(matches!(err, CriticError::Config(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn blank_api_key_is_missing() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAi,
            api_key: Some("   ".into()),
            ..LlmConfig::default()
        };
        let err = LlmClient::new(&config).err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn openai_without_model_sends_openai_default() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({ "model": "gpt-4o-mini" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let config = LlmConfig {
            model: None,
            ..config(LlmProvider::OpenAi, server.url())
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.generate("review me").await.unwrap(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn gemini_request_carries_key_and_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/test-model:generateContent")
            .match_header("x-goog-api-key", "secret")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{ "parts": [{ "text": "review me" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"- fine"},{"text":"\n- ship it"}]}}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new(&config(LlmProvider::Gemini, server.url())).unwrap();
        let text = client.generate("review me").await.unwrap();

        assert_eq!(text, "- fine\n- ship it");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn gemini_blocked_prompt_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/test-model:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let client = LlmClient::new(&config(LlmProvider::Gemini, server.url())).unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn gemini_error_status_is_propagated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/test-model:generateContent")
            .with_status(429)
            .with_body(r#"{"error":{"message":"quota exceeded"}}"#)
            .create_async()
            .await;

        let client = LlmClient::new(&config(LlmProvider::Gemini, server.url())).unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, CriticError::Llm(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn openai_request_uses_bearer_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "messages": [{ "role": "user", "content": "review me" }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"LGTM"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new(&config(LlmProvider::OpenAi, server.url())).unwrap();
        let text = client.review("review me").await.unwrap();

        assert_eq!(text, "LGTM");
        mock.assert_async().await;
    }

    #[test]
    fn openai_unexpected_shape_is_an_error() {
        let body = serde_json::json!({ "choices": [] });
        assert!(extract_openai_text(&body).is_err());
    }

    #[test]
    fn gemini_candidate_without_text_is_an_error() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }]
        });
        assert!(extract_gemini_text(&body).is_err());
    }
}
