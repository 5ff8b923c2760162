//! Facial-emotion judgment types.

use serde::{Deserialize, Serialize};

/// Sentinel label for "no usable face signal".
pub const UNKNOWN_EMOTION: &str = "UNKNOWN";

/// A facial-emotion judgment over one face photo.
///
/// Facial emotion is always advisory: when a face image was supplied but
/// could not be analyzed, the result is the explicit UNKNOWN sentinel (a
/// value, not an absent field) carrying the failure detail in `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacialEmotionResult {
    /// Upper-cased dominant emotion name, or `"UNKNOWN"`.
    pub label: String,
    /// Capability-reported score in `[0, 100]`; `0.0` for the sentinel.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FacialEmotionResult {
    /// A successful judgment. The label is upper-cased here so every
    /// caller sees the same form.
    pub fn detected(label: impl AsRef<str>, score: f32) -> Self {
        Self {
            label: label.as_ref().to_uppercase(),
            score,
            error: None,
        }
    }

    /// The UNKNOWN sentinel with the stringified failure detail.
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self {
            label: UNKNOWN_EMOTION.to_string(),
            score: 0.0,
            error: Some(detail.into()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_EMOTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_upper_cases_the_label() {
        let result = FacialEmotionResult::detected("happy", 93.2);
        assert_eq!(result.label, "HAPPY");
        assert!(!result.is_unknown());
        assert!(result.error.is_none());
    }

    #[test]
    fn unknown_sentinel_carries_the_detail() {
        let result = FacialEmotionResult::unknown("image decode failed");
        assert!(result.is_unknown());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.error.as_deref(), Some("image decode failed"));
    }

    #[test]
    fn error_field_is_omitted_on_success() {
        let json = serde_json::to_value(FacialEmotionResult::detected("SAD", 55.0)).unwrap();
        assert!(json.get("error").is_none());
    }
}
