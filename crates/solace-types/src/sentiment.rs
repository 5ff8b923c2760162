//! Sentiment judgment types.

use serde::{Deserialize, Serialize};

/// Sentiment polarity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = "POSITIVE")]
    Positive,
    #[serde(rename = "NEGATIVE")]
    Negative,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

impl SentimentLabel {
    /// Returns the upper-cased wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }

    /// Attempts to parse a label string, case-insensitively.
    ///
    /// Returns `None` for anything outside the three known classes.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Some(Self::Positive),
            "NEGATIVE" => Some(Self::Negative),
            "NEUTRAL" => Some(Self::Neutral),
            _ => None,
        }
    }
}

/// A sentiment judgment over one piece of text.
///
/// `score` is a confidence/intensity magnitude in `[0, 1]`, not a signed
/// polarity. `used_fallback` distinguishes a lexical approximation from a
/// model judgment so callers can weigh the two differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f32,
    #[serde(rename = "usedFallback")]
    pub used_fallback: bool,
}
