//! Turn processing for the Solace platform.
//!
//! One conversational turn — spoken audio, typed text, or a face photo —
//! comes in; a therapeutic reply with sentiment and facial-emotion
//! annotations comes out, optionally with a synthesized-audio artifact.
//!
//! The pipeline validates and normalizes each present modality, fuses the
//! signals into a generation prompt, and assembles a single result per
//! request. External model capabilities (recognition, sentiment, facial
//! analysis, generation, synthesis) sit behind trait seams so deployments
//! can swap backends and tests can substitute mocks. Facial analysis and
//! text generation are advisory: their failures degrade the result, never
//! fail the turn.

pub mod config;
pub mod duration;
pub mod error;
pub mod facial;
pub mod orchestrator;
pub mod prompt;
pub mod respond;
pub mod sentiment;
pub mod synthesize;
pub mod transcribe;
pub mod validate;

pub use config::{AudioLimits, FacialConfig, GenerationConfig, SentimentConfig, SpeechConfig};
pub use error::{TurnError, ValidationRejection};
pub use facial::{AnalyzerCliFaceEmotion, FaceEmotion, FacialEmotionAnalyzer};
pub use orchestrator::{detect_request, ChatPayload, TurnPipeline};
pub use prompt::compose_prompt;
pub use respond::{GeminiClient, ResponseGenerator, ResponseModel};
pub use sentiment::{CliSentimentModel, SentimentAnalyzer, SentimentModel};
pub use synthesize::{ArtifactStore, AudioArtifact, SpeechSynthesizer, TtsCli};
pub use transcribe::{SpeechToText, SttFailure, WhisperCliStt};
pub use validate::{sanitize_filename, ScopedAudioFile, Validator};
