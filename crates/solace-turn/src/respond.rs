//! Response generation adapter.
//!
//! Two policies coexist. Text turns go through the external generation
//! capability with a composed prompt, degrading to an explanatory fallback
//! string when the capability is unconfigured or fails. Audio turns never
//! attempt generation: the reply comes from a fixed sentiment mapping.
//! Either way the reply text is never empty.

use async_trait::async_trait;
use solace_types::{GeneratedResponse, ResponseSource, SentimentLabel};
use std::sync::Arc;
use std::time::Duration;

/// Timeout for one generation request.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Reply when no generation credential is configured.
pub const NOT_CONFIGURED_REPLY: &str =
    "Gemini API key is not set. Please set the GEMINI_API_KEY environment variable.";

/// Reply when generation fails, carrying the failure detail.
fn generation_error_reply(detail: &str) -> String {
    format!("Sorry, I couldn't generate a response right now. Error: {detail}")
}

/// The fixed sentiment → reply mapping used for audio turns and as the
/// last-resort fallback. The wording is part of the external contract.
pub fn sentiment_reply(label: SentimentLabel) -> &'static str {
    match label {
        SentimentLabel::Negative => {
            "I'm here for you. It sounds like you're having a hard time. Can you tell me more?"
        }
        SentimentLabel::Positive => "That's wonderful to hear! Keep up the positive momentum.",
        SentimentLabel::Neutral => "I'm listening. Tell me how you're feeling today.",
    }
}

/// Text-generation capability.
#[async_trait]
pub trait ResponseModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, String>;
}

/// Client for the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(GENERATION_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl ResponseModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("generation request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("generation API returned {status}: {detail}"));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("generation response was not valid JSON: {e}"))?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(text)
    }
}

/// The response-generator adapter.
#[derive(Clone)]
pub struct ResponseGenerator {
    model: Option<Arc<dyn ResponseModel>>,
}

impl ResponseGenerator {
    pub fn new(model: Option<Arc<dyn ResponseModel>>) -> Self {
        Self { model }
    }

    /// No credential configured: every prompt degrades to the explanatory
    /// fallback.
    pub fn unconfigured() -> Self {
        Self { model: None }
    }

    /// Prompt policy (text turns). Always returns non-empty text.
    pub async fn respond_to_prompt(
        &self,
        prompt: &str,
        sentiment: SentimentLabel,
    ) -> GeneratedResponse {
        let model = match &self.model {
            Some(model) => model,
            None => {
                return GeneratedResponse {
                    text: NOT_CONFIGURED_REPLY.to_string(),
                    source: ResponseSource::Fallback,
                }
            }
        };

        match model.generate(prompt).await {
            Ok(text) if !text.trim().is_empty() => GeneratedResponse {
                text,
                source: ResponseSource::Model,
            },
            Ok(_) => {
                tracing::warn!("generation produced empty text, using sentiment fallback");
                GeneratedResponse {
                    text: sentiment_reply(sentiment).to_string(),
                    source: ResponseSource::Fallback,
                }
            }
            Err(detail) => {
                tracing::warn!(error = %detail, "generation failed, using fallback reply");
                GeneratedResponse {
                    text: generation_error_reply(&detail),
                    source: ResponseSource::Fallback,
                }
            }
        }
    }

    /// Sentiment policy (audio turns): no generation is attempted.
    pub fn respond_to_sentiment(&self, sentiment: SentimentLabel) -> GeneratedResponse {
        GeneratedResponse {
            text: sentiment_reply(sentiment).to_string(),
            source: ResponseSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReply(&'static str);

    #[async_trait]
    impl ResponseModel for FixedReply {
        async fn generate(&self, _prompt: &str) -> Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ResponseModel for FailingModel {
        async fn generate(&self, _prompt: &str) -> Result<String, String> {
            Err("quota exceeded".to_string())
        }
    }

    #[test]
    fn sentiment_mapping_is_exact() {
        assert_eq!(
            sentiment_reply(SentimentLabel::Negative),
            "I'm here for you. It sounds like you're having a hard time. Can you tell me more?"
        );
        assert_eq!(
            sentiment_reply(SentimentLabel::Positive),
            "That's wonderful to hear! Keep up the positive momentum."
        );
        assert_eq!(
            sentiment_reply(SentimentLabel::Neutral),
            "I'm listening. Tell me how you're feeling today."
        );
    }

    #[tokio::test]
    async fn missing_credential_yields_the_explanatory_reply() {
        let generator = ResponseGenerator::unconfigured();
        let response = generator
            .respond_to_prompt("prompt", SentimentLabel::Negative)
            .await;

        assert_eq!(response.text, NOT_CONFIGURED_REPLY);
        assert_eq!(response.source, ResponseSource::Fallback);
    }

    #[tokio::test]
    async fn generation_failure_carries_the_detail() {
        let generator = ResponseGenerator::new(Some(Arc::new(FailingModel)));
        let response = generator
            .respond_to_prompt("prompt", SentimentLabel::Neutral)
            .await;

        assert_eq!(
            response.text,
            "Sorry, I couldn't generate a response right now. Error: quota exceeded"
        );
        assert_eq!(response.source, ResponseSource::Fallback);
    }

    #[tokio::test]
    async fn empty_generation_degrades_to_the_sentiment_mapping() {
        let generator = ResponseGenerator::new(Some(Arc::new(FixedReply("   "))));
        let response = generator
            .respond_to_prompt("prompt", SentimentLabel::Positive)
            .await;

        assert_eq!(response.text, sentiment_reply(SentimentLabel::Positive));
        assert_eq!(response.source, ResponseSource::Fallback);
    }

    #[tokio::test]
    async fn model_reply_is_tagged_as_model() {
        let generator = ResponseGenerator::new(Some(Arc::new(FixedReply(
            "It sounds like today carried a lot. What felt heaviest?",
        ))));
        let response = generator
            .respond_to_prompt("prompt", SentimentLabel::Negative)
            .await;

        assert_eq!(response.source, ResponseSource::Model);
        assert!(!response.text.is_empty());
    }

    #[tokio::test]
    async fn response_is_never_empty() {
        for label in [
            SentimentLabel::Positive,
            SentimentLabel::Negative,
            SentimentLabel::Neutral,
        ] {
            let generator = ResponseGenerator::unconfigured();
            assert!(!generator.respond_to_sentiment(label).text.is_empty());
            assert!(
                !generator
                    .respond_to_prompt("prompt", label)
                    .await
                    .text
                    .is_empty()
            );
        }
    }
}
