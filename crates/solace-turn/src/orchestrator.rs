//! The turn orchestrator.
//!
//! Sequences the adapters for one conversational turn: exactly one
//! modality path runs per invocation and exactly one result (or one
//! failure) comes back. All intermediate state dies with the invocation;
//! the stored reply audio is the only artifact that outlives it.

use crate::error::TurnError;
use crate::facial::{decode_inline_image, FacialEmotionAnalyzer};
use crate::prompt::compose_prompt;
use crate::respond::ResponseGenerator;
use crate::sentiment::SentimentAnalyzer;
use crate::synthesize::{ArtifactStore, SpeechSynthesizer};
use crate::transcribe::{SpeechToText, SttFailure};
use crate::validate::Validator;
use serde::Deserialize;
use solace_types::{TurnRequest, TurnResult};
use std::sync::Arc;

/// Decoded body of a JSON text turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: String,
    /// Optionally data-URI-prefixed base64 image.
    #[serde(default)]
    pub face_image: Option<String>,
}

/// Determines the turn modality from the decoded boundary fields, in the
/// fixed order audio → text → image.
///
/// An undecodable `face_image` payload is passed through as raw bytes so
/// the facial adapter degrades it to the UNKNOWN sentinel; a bad inline
/// image must not reject an otherwise valid text turn.
pub fn detect_request(
    audio: Option<(String, Vec<u8>)>,
    chat: Option<ChatPayload>,
    image: Option<Vec<u8>>,
) -> Result<TurnRequest, TurnError> {
    if let Some((filename, bytes)) = audio {
        if !filename.is_empty() {
            return Ok(TurnRequest::Audio { bytes, filename });
        }
    }

    if let Some(payload) = chat {
        let face_image = payload.face_image.map(|encoded| {
            decode_inline_image(&encoded).unwrap_or_else(|_| encoded.into_bytes())
        });
        return Ok(TurnRequest::Text {
            message: payload.message,
            face_image,
        });
    }

    if let Some(bytes) = image {
        return Ok(TurnRequest::Image { bytes });
    }

    Err(TurnError::NoUsableInput)
}

/// Owns the adapters and drives one turn end to end.
#[derive(Clone)]
pub struct TurnPipeline {
    validator: Validator,
    stt: Arc<dyn SpeechToText>,
    sentiment: SentimentAnalyzer,
    facial: FacialEmotionAnalyzer,
    generator: ResponseGenerator,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    artifacts: ArtifactStore,
}

impl TurnPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        validator: Validator,
        stt: Arc<dyn SpeechToText>,
        sentiment: SentimentAnalyzer,
        facial: FacialEmotionAnalyzer,
        generator: ResponseGenerator,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            validator,
            stt,
            sentiment,
            facial,
            generator,
            synthesizer,
            artifacts,
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Processes one turn. Exactly one `TurnResult` or one `TurnError`
    /// per request.
    pub async fn process(&self, request: TurnRequest) -> Result<TurnResult, TurnError> {
        let modality = request.modality();
        tracing::info!(modality, "processing turn");

        let result = match request {
            TurnRequest::Audio { bytes, filename } => self.process_audio(bytes, &filename).await,
            TurnRequest::Text {
                message,
                face_image,
            } => self.process_text(&message, face_image).await,
            TurnRequest::Image { bytes } => Ok(self.process_image(&bytes).await),
        };

        match &result {
            Ok(_) => tracing::info!(modality, "turn completed"),
            Err(e) => tracing::warn!(modality, code = e.reason_code(), "turn failed: {e}"),
        }
        result
    }

    async fn process_audio(&self, bytes: Vec<u8>, filename: &str) -> Result<TurnResult, TurnError> {
        let file = self.validator.validate(&bytes, filename).await?;

        let duration = file.duration_secs();
        let file_size_mb = file.size_mb();
        let stored_filename = file.original_filename().to_string();

        // Load the materialized file back into memory for the recognizer.
        let audio = tokio::fs::read(file.path())
            .await
            .map_err(|e| TurnError::Storage(format!("failed to read upload: {e}")))?;

        let transcription = self.stt.transcribe(&audio).await;
        // The temp upload is released here, before the result is
        // assembled, on success and failure alike.
        drop(file);

        let transcript = match transcription {
            Ok(text) => text,
            Err(SttFailure::NoSpeech) => return Err(TurnError::Unintelligible),
            Err(SttFailure::Backend(detail)) => return Err(TurnError::Transcription(detail)),
        };

        let sentiment = self.sentiment.analyze(&transcript).await;
        let response = self.generator.respond_to_sentiment(sentiment.label);

        let reply_audio = self
            .synthesizer
            .synthesize(&response.text)
            .await
            .map_err(TurnError::Synthesis)?;
        let artifact = self
            .artifacts
            .store_mpeg(&reply_audio)
            .await
            .map_err(TurnError::Synthesis)?;

        Ok(TurnResult {
            transcript: Some(transcript),
            sentiment: Some(sentiment),
            response: Some(response.text),
            audio_response: Some(artifact.download_path()),
            duration,
            file_size_mb: Some(file_size_mb),
            filename: Some(stored_filename),
            facial_emotion: None,
        })
    }

    async fn process_text(
        &self,
        message: &str,
        face_image: Option<Vec<u8>>,
    ) -> Result<TurnResult, TurnError> {
        let facial_emotion = match face_image {
            Some(bytes) => Some(self.facial.analyze_bytes(&bytes).await),
            None => None,
        };

        let sentiment = self.sentiment.analyze(message).await;
        let prompt = compose_prompt(message, facial_emotion.as_ref());
        let response = self
            .generator
            .respond_to_prompt(&prompt, sentiment.label)
            .await;

        Ok(TurnResult {
            sentiment: Some(sentiment),
            response: Some(response.text),
            facial_emotion,
            ..Default::default()
        })
    }

    async fn process_image(&self, bytes: &[u8]) -> TurnResult {
        TurnResult {
            facial_emotion: Some(self.facial.analyze_bytes(bytes).await),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_wins_modality_detection() {
        let request = detect_request(
            Some(("clip.wav".to_string(), vec![1, 2, 3])),
            Some(ChatPayload {
                message: "hello".to_string(),
                face_image: None,
            }),
            Some(vec![9]),
        )
        .unwrap();
        assert!(matches!(request, TurnRequest::Audio { .. }));
    }

    #[test]
    fn unnamed_audio_falls_through_to_text() {
        let request = detect_request(
            Some((String::new(), vec![1, 2, 3])),
            Some(ChatPayload {
                message: "hello".to_string(),
                face_image: None,
            }),
            None,
        )
        .unwrap();
        assert!(matches!(request, TurnRequest::Text { .. }));
    }

    #[test]
    fn image_is_the_last_resort() {
        let request = detect_request(None, None, Some(vec![9])).unwrap();
        assert!(matches!(request, TurnRequest::Image { .. }));
    }

    #[test]
    fn nothing_usable_is_rejected() {
        let result = detect_request(None, None, None);
        assert!(matches!(result, Err(TurnError::NoUsableInput)));
    }

    #[test]
    fn bad_inline_image_does_not_reject_the_turn() {
        let request = detect_request(
            None,
            Some(ChatPayload {
                message: "hello".to_string(),
                face_image: Some("!!not base64!!".to_string()),
            }),
            None,
        )
        .unwrap();
        match request {
            TurnRequest::Text { face_image, .. } => assert!(face_image.is_some()),
            other => panic!("expected Text, got {other:?}"),
        }
    }
}
