//! Facial-emotion adapter.
//!
//! Facial emotion is always advisory: every failure mode — undecodable
//! bytes, a missing or crashing analyzer, an empty result set — degrades
//! to the UNKNOWN sentinel carrying the failure detail. This adapter never
//! returns an error to the orchestrator.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbImage;
use serde::Deserialize;
use solace_types::FacialEmotionResult;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::validate::round2;

/// Timeout for analyzer process execution.
const ANALYZE_TIMEOUT: Duration = Duration::from_secs(60);

/// One per-face reading from the analyzer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaceReading {
    pub label: String,
    pub score: f32,
}

/// Face-emotion capability.
///
/// Implementations must tolerate undetected faces: an empty collection is
/// a valid success, not an error.
#[async_trait]
pub trait FaceEmotion: Send + Sync {
    async fn analyze(&self, image: &RgbImage) -> Result<Vec<FaceReading>, String>;
}

/// Analyzer backed by a DeepFace-style wrapper script.
///
/// The image is PNG-encoded and written to stdin; the script prints a JSON
/// array of `{label, score}` readings, one per detected face.
#[derive(Debug, Clone)]
pub struct AnalyzerCliFaceEmotion {
    binary_path: PathBuf,
}

impl AnalyzerCliFaceEmotion {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }
}

#[async_trait]
impl FaceEmotion for AnalyzerCliFaceEmotion {
    async fn analyze(&self, image: &RgbImage) -> Result<Vec<FaceReading>, String> {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(image.clone())
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| format!("failed to encode image: {e}"))?;

        let mut child = Command::new(&self.binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn analyzer: {e}"))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "failed to open stdin".to_string())?;
        stdin
            .write_all(&png)
            .await
            .map_err(|e| format!("failed to write to stdin: {e}"))?;
        drop(stdin);

        let output = tokio::time::timeout(ANALYZE_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                format!(
                    "analyzer timed out after {} seconds",
                    ANALYZE_TIMEOUT.as_secs()
                )
            })?
            .map_err(|e| format!("failed to read stdout: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("analyzer failed: {stderr}"));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("analyzer output was not valid JSON: {e}"))
    }
}

/// Decodes an optionally data-URI-prefixed base64 image payload.
pub fn decode_inline_image(encoded: &str) -> Result<Vec<u8>, String> {
    let payload = match encoded.split_once(',') {
        Some((_header, data)) => data,
        None => encoded,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 image payload: {e}"))
}

/// The facial-emotion adapter.
#[derive(Clone)]
pub struct FacialEmotionAnalyzer {
    capability: Option<Arc<dyn FaceEmotion>>,
}

impl FacialEmotionAnalyzer {
    pub fn new(capability: Option<Arc<dyn FaceEmotion>>) -> Self {
        Self { capability }
    }

    /// No analyzer deployed: every photo degrades to the sentinel.
    pub fn disabled() -> Self {
        Self { capability: None }
    }

    /// Analyzes raw image bytes. Infallible: failures come back as the
    /// UNKNOWN sentinel with the failure detail.
    pub async fn analyze_bytes(&self, bytes: &[u8]) -> FacialEmotionResult {
        let image = match image::load_from_memory(bytes) {
            Ok(decoded) => decoded.to_rgb8(),
            Err(e) => return FacialEmotionResult::unknown(format!("image decode failed: {e}")),
        };

        let capability = match &self.capability {
            Some(capability) => capability,
            None => return FacialEmotionResult::unknown("no facial analyzer configured"),
        };

        match capability.analyze(&image).await {
            Ok(readings) => match readings.first() {
                Some(reading) => FacialEmotionResult::detected(
                    &reading.label,
                    round2(f64::from(reading.score.clamp(0.0, 100.0))) as f32,
                ),
                None => FacialEmotionResult::unknown("no face detected"),
            },
            Err(detail) => {
                tracing::warn!(error = %detail, "facial analysis degraded to UNKNOWN");
                FacialEmotionResult::unknown(detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFaces(Vec<FaceReading>);

    #[async_trait]
    impl FaceEmotion for FixedFaces {
        async fn analyze(&self, _image: &RgbImage) -> Result<Vec<FaceReading>, String> {
            Ok(self.0.clone())
        }
    }

    struct CrashingAnalyzer;

    #[async_trait]
    impl FaceEmotion for CrashingAnalyzer {
        async fn analyze(&self, _image: &RgbImage) -> Result<Vec<FaceReading>, String> {
            Err("segfault in model backend".to_string())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::from_pixel(4, 4, image::Rgb([128, 64, 32]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    #[tokio::test]
    async fn non_image_bytes_yield_the_sentinel() {
        let analyzer = FacialEmotionAnalyzer::new(Some(Arc::new(CrashingAnalyzer)));
        let result = analyzer.analyze_bytes(b"definitely not an image").await;

        assert!(result.is_unknown());
        assert_eq!(result.score, 0.0);
        assert!(result.error.as_deref().unwrap().contains("decode"));
    }

    #[tokio::test]
    async fn first_face_wins() {
        let analyzer = FacialEmotionAnalyzer::new(Some(Arc::new(FixedFaces(vec![
            FaceReading {
                label: "happy".to_string(),
                score: 97.314,
            },
            FaceReading {
                label: "sad".to_string(),
                score: 55.0,
            },
        ]))));

        let result = analyzer.analyze_bytes(&png_bytes()).await;
        assert_eq!(result.label, "HAPPY");
        assert_eq!(result.score, 97.31);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn no_face_yields_the_sentinel() {
        let analyzer = FacialEmotionAnalyzer::new(Some(Arc::new(FixedFaces(vec![]))));
        let result = analyzer.analyze_bytes(&png_bytes()).await;

        assert!(result.is_unknown());
        assert_eq!(result.error.as_deref(), Some("no face detected"));
    }

    #[tokio::test]
    async fn capability_failure_never_propagates() {
        let analyzer = FacialEmotionAnalyzer::new(Some(Arc::new(CrashingAnalyzer)));
        let result = analyzer.analyze_bytes(&png_bytes()).await;

        assert!(result.is_unknown());
        assert!(result.error.as_deref().unwrap().contains("segfault"));
    }

    #[tokio::test]
    async fn unconfigured_analyzer_yields_the_sentinel() {
        let analyzer = FacialEmotionAnalyzer::disabled();
        let result = analyzer.analyze_bytes(&png_bytes()).await;

        assert!(result.is_unknown());
        assert!(result.error.is_some());
    }

    #[test]
    fn inline_image_decode_handles_data_uris() {
        let plain = BASE64.encode(b"pixels");
        assert_eq!(decode_inline_image(&plain).unwrap(), b"pixels");

        let with_header = format!("data:image/png;base64,{plain}");
        assert_eq!(decode_inline_image(&with_header).unwrap(), b"pixels");

        assert!(decode_inline_image("!!not base64!!").is_err());
    }
}
