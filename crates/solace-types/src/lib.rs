//! Shared types for the Solace platform.
//!
//! This crate provides the foundational types used across all Solace crates:
//! the decoded turn request, the aggregate turn result returned to the
//! caller, and the sentiment and facial-emotion value types.
//!
//! No crate in the workspace depends on anything *except* `solace-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

pub mod emotion;
pub mod sentiment;

pub use emotion::FacialEmotionResult;
pub use sentiment::{SentimentLabel, SentimentResult};

use serde::{Deserialize, Serialize};

/// One decoded conversational turn.
///
/// Exactly one input shape is active per request. The transport layer
/// decodes raw multipart/JSON payloads into this union; the pipeline never
/// sees transport-level structures.
#[derive(Debug, Clone)]
pub enum TurnRequest {
    /// A spoken turn: an uploaded audio file and its declared filename.
    Audio { bytes: Vec<u8>, filename: String },
    /// A typed turn, optionally accompanied by an inline face photo.
    Text {
        message: String,
        face_image: Option<Vec<u8>>,
    },
    /// A standalone face photo with no message.
    Image { bytes: Vec<u8> },
}

impl TurnRequest {
    /// Returns the modality name, used in logs.
    pub fn modality(&self) -> &'static str {
        match self {
            Self::Audio { .. } => "audio",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
        }
    }
}

/// Provenance of a therapeutic reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Produced by the external generation capability.
    Model,
    /// Produced by a deterministic fallback policy.
    Fallback,
}

/// A therapeutic reply together with its provenance.
///
/// Invariant: `text` is never empty. Generation adapters degrade to a
/// fallback string rather than returning nothing.
#[derive(Debug, Clone)]
pub struct GeneratedResponse {
    pub text: String,
    pub source: ResponseSource,
}

/// The aggregate returned to the caller for one turn.
///
/// All fields are optional; which are populated depends on the input
/// modality. Fields outside the active path are absent from the serialized
/// form rather than defaulted to empty structures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Relative download path of the synthesized reply audio, of the form
    /// `/download/<uuid>.mp3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_response: Option<String>,
    /// Measured duration of the uploaded audio in seconds, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,
    /// Sanitized original filename of the uploaded audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facial_emotion: Option<FacialEmotionResult>,
}
