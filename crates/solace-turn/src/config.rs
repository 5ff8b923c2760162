//! Pipeline configuration sections.
//!
//! Each section deserializes from the server's TOML config with per-field
//! defaults. The generation credential is populated from the process
//! environment by the caller, never from the file, and is redacted from
//! `Debug` output.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

fn default_allowed_extensions() -> Vec<String> {
    vec!["wav".to_string(), "mp3".to_string(), "mpeg".to_string()]
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_max_duration_secs() -> u64 {
    30
}

fn default_enforce_max_duration() -> bool {
    true
}

fn default_generation_model() -> String {
    "gemini-2.0-flash".to_string()
}

/// Bounds applied to uploaded audio before any expensive processing.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioLimits {
    /// Accepted filename extensions, compared case-insensitively.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Maximum upload size in MiB.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Maximum audio duration in seconds.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    /// Whether the duration bound is enforced. When false the probe still
    /// runs (the measured duration is reported) but the bound is not
    /// applied.
    #[serde(default = "default_enforce_max_duration")]
    pub enforce_max_duration: bool,
}

impl Default for AudioLimits {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_file_size_mb: default_max_file_size_mb(),
            max_duration_secs: default_max_duration_secs(),
            enforce_max_duration: default_enforce_max_duration(),
        }
    }
}

impl AudioLimits {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

/// Paths to the external speech tools.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechConfig {
    /// Speech-to-text binary (whisper.cpp style: `-m <model> -f -`).
    #[serde(default)]
    pub stt_binary: PathBuf,

    /// Speech-to-text model file.
    #[serde(default)]
    pub stt_model: PathBuf,

    /// Text-to-speech binary writing MP3 to stdout.
    #[serde(default)]
    pub tts_binary: PathBuf,
}

/// Optional external sentiment classifier. When unset the adapter runs on
/// the lexical fallback alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentConfig {
    #[serde(default)]
    pub classifier_binary: Option<PathBuf>,

    #[serde(default)]
    pub classifier_model: Option<PathBuf>,
}

/// Optional external facial-emotion analyzer. When unset every face photo
/// degrades to the UNKNOWN sentinel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacialConfig {
    #[serde(default)]
    pub analyzer_binary: Option<PathBuf>,
}

/// External text-generation capability.
#[derive(Clone, Deserialize)]
pub struct GenerationConfig {
    /// Model name passed to the Generative Language API.
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API credential, populated from the `GEMINI_API_KEY` environment
    /// variable by the caller. Absence is not fatal: text turns degrade to
    /// an explanatory fallback reply.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            api_key: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
