//! Error taxonomy for turn processing.
//!
//! Only validation, transcription, and synthesis failures propagate out of
//! the pipeline. Facial-analysis and generation failures are absorbed into
//! a still-successful result with a degraded field; they never appear here.

use thiserror::Error;

/// A typed validation rejection carrying the offending measured value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationRejection {
    #[error("Invalid file type. Allowed: wav, mp3, mpeg.")]
    BadExtension { extension: String },

    #[error("File too large. Max size is {limit_mb} MB.")]
    TooLarge { size_mb: f64, limit_mb: u64 },

    #[error("Audio too long. Max duration is {limit_secs} seconds.")]
    TooLong { duration_secs: f64, limit_secs: u64 },
}

impl ValidationRejection {
    /// Stable machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::BadExtension { .. } => "bad_extension",
            Self::TooLarge { .. } => "file_too_large",
            Self::TooLong { .. } => "audio_too_long",
        }
    }
}

/// A turn-level failure.
///
/// `is_client_error()` splits the taxonomy into caller errors
/// (4xx-equivalent) and infrastructure errors (5xx-equivalent).
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Rejected(#[from] ValidationRejection),

    #[error("Could not understand audio.")]
    Unintelligible,

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("TTS failed: {0}")]
    Synthesis(String),

    #[error("Storage failed: {0}")]
    Storage(String),

    #[error("No usable input. Provide an audio file, a message, or an image.")]
    NoUsableInput,
}

impl TurnError {
    /// Stable machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.reason_code(),
            Self::Unintelligible => "unintelligible",
            Self::Transcription(_) => "transcription_failed",
            Self::Synthesis(_) => "synthesis_failed",
            Self::Storage(_) => "storage_failed",
            Self::NoUsableInput => "no_usable_input",
        }
    }

    /// True for caller errors (4xx-equivalent), false for infrastructure
    /// errors (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Rejected(_) | Self::Unintelligible | Self::NoUsableInput
        )
    }
}
