//! End-to-end pipeline scenarios with mock capabilities.

use async_trait::async_trait;
use solace_turn::facial::{FaceEmotion, FaceReading};
use solace_turn::respond::{ResponseModel, NOT_CONFIGURED_REPLY};
use solace_turn::transcribe::{SpeechToText, SttFailure};
use solace_turn::{
    ArtifactStore, AudioLimits, FacialEmotionAnalyzer, ResponseGenerator, SentimentAnalyzer,
    SpeechSynthesizer, TurnError, TurnPipeline, ValidationRejection, Validator,
};
use solace_types::{SentimentLabel, TurnRequest};
use std::path::Path;
use std::sync::{Arc, Mutex};

struct FixedStt(&'static str);

#[async_trait]
impl SpeechToText for FixedStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, SttFailure> {
        Ok(self.0.to_string())
    }
}

struct DeafStt;

#[async_trait]
impl SpeechToText for DeafStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, SttFailure> {
        Err(SttFailure::NoSpeech)
    }
}

struct BrokenStt;

#[async_trait]
impl SpeechToText for BrokenStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, SttFailure> {
        Err(SttFailure::Backend("recognizer offline".to_string()))
    }
}

struct FixedTts;

#[async_trait]
impl SpeechSynthesizer for FixedTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, String> {
        Ok(b"ID3 fake mpeg".to_vec())
    }
}

struct BrokenTts;

#[async_trait]
impl SpeechSynthesizer for BrokenTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, String> {
        Err("engine crashed".to_string())
    }
}

struct FixedFaces(Vec<FaceReading>);

#[async_trait]
impl FaceEmotion for FixedFaces {
    async fn analyze(&self, _image: &image::RgbImage) -> Result<Vec<FaceReading>, String> {
        Ok(self.0.clone())
    }
}

/// Captures the prompt it was handed.
struct CapturingModel(Arc<Mutex<Option<String>>>);

#[async_trait]
impl ResponseModel for CapturingModel {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        *self.0.lock().unwrap() = Some(prompt.to_string());
        Ok("A reply shaped by everything you shared.".to_string())
    }
}

fn pipeline(
    dir: &Path,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn SpeechSynthesizer>,
) -> TurnPipeline {
    TurnPipeline::new(
        Validator::new(AudioLimits::default(), dir),
        stt,
        SentimentAnalyzer::lexical_only(),
        FacialEmotionAnalyzer::disabled(),
        ResponseGenerator::unconfigured(),
        tts,
        ArtifactStore::new(dir),
    )
}

fn wav_bytes(seconds: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for _ in 0..seconds * 8_000 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = dir
        .read_dir()
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn audio_turn_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        Arc::new(FixedStt("i am so happy today")),
        Arc::new(FixedTts),
    );

    let result = pipeline
        .process(TurnRequest::Audio {
            bytes: wav_bytes(5),
            filename: "clip.wav".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result.transcript.as_deref(), Some("i am so happy today"));
    let sentiment = result.sentiment.unwrap();
    assert_eq!(sentiment.label, SentimentLabel::Positive);
    assert!(sentiment.used_fallback);
    assert_eq!(
        result.response.as_deref(),
        Some("That's wonderful to hear! Keep up the positive momentum.")
    );
    let download = result.audio_response.unwrap();
    assert!(download.starts_with("/download/"));
    assert!((result.duration.unwrap() - 5.0).abs() < 0.01);
    assert_eq!(result.filename.as_deref(), Some("clip.wav"));
    assert!(result.file_size_mb.is_some());
    assert!(result.facial_emotion.is_none());

    // The temp upload is gone; only the stored reply artifact remains.
    let files = files_in(dir.path());
    assert_eq!(files.len(), 1, "leftover files: {files:?}");
    assert_eq!(
        format!("/download/{}", files[0]),
        download,
        "the surviving file must be the advertised artifact"
    );
}

#[tokio::test]
async fn text_turn_without_credential_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), Arc::new(DeafStt), Arc::new(FixedTts));

    let result = pipeline
        .process(TurnRequest::Text {
            message: "I feel hopeless".to_string(),
            face_image: None,
        })
        .await
        .unwrap();

    assert_eq!(result.sentiment.unwrap().label, SentimentLabel::Negative);
    assert_eq!(result.response.as_deref(), Some(NOT_CONFIGURED_REPLY));
    assert!(result.facial_emotion.is_none());
    assert!(result.transcript.is_none());
    assert!(result.audio_response.is_none());
    assert!(result.duration.is_none());
    assert!(result.filename.is_none());
}

#[tokio::test]
async fn image_turn_with_undecodable_bytes_yields_the_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), Arc::new(DeafStt), Arc::new(FixedTts));

    let result = pipeline
        .process(TurnRequest::Image {
            bytes: b"not an image at all".to_vec(),
        })
        .await
        .unwrap();

    let facial = result.facial_emotion.unwrap();
    assert_eq!(facial.label, "UNKNOWN");
    assert_eq!(facial.score, 0.0);
    assert!(!facial.error.unwrap().is_empty());

    assert!(result.sentiment.is_none());
    assert!(result.response.is_none());
    assert!(result.transcript.is_none());
}

#[tokio::test]
async fn facial_signal_reaches_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let captured = Arc::new(Mutex::new(None));

    let pipeline = TurnPipeline::new(
        Validator::new(AudioLimits::default(), dir.path()),
        Arc::new(DeafStt),
        SentimentAnalyzer::lexical_only(),
        FacialEmotionAnalyzer::new(Some(Arc::new(FixedFaces(vec![FaceReading {
            label: "sad".to_string(),
            score: 88.5,
        }])))),
        ResponseGenerator::new(Some(Arc::new(CapturingModel(captured.clone())))),
        Arc::new(FixedTts),
        ArtifactStore::new(dir.path()),
    );

    let image = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 180, 160]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let result = pipeline
        .process(TurnRequest::Text {
            message: "I had a rough day".to_string(),
            face_image: Some(png),
        })
        .await
        .unwrap();

    assert_eq!(result.facial_emotion.as_ref().unwrap().label, "SAD");
    assert_eq!(
        result.response.as_deref(),
        Some("A reply shaped by everything you shared.")
    );

    let prompt = captured.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("compassionate therapist"));
    assert!(prompt.contains("'I had a rough day'"));
    assert!(prompt.contains("sad (score: 88.5)"));
}

#[tokio::test]
async fn bad_extension_is_rejected_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), Arc::new(DeafStt), Arc::new(FixedTts));

    let result = pipeline
        .process(TurnRequest::Audio {
            bytes: wav_bytes(2),
            filename: "clip.ogg".to_string(),
        })
        .await;

    assert!(matches!(
        result,
        Err(TurnError::Rejected(ValidationRejection::BadExtension { .. }))
    ));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn unintelligible_audio_cleans_up_the_upload() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), Arc::new(DeafStt), Arc::new(FixedTts));

    let result = pipeline
        .process(TurnRequest::Audio {
            bytes: wav_bytes(2),
            filename: "clip.wav".to_string(),
        })
        .await;

    assert!(matches!(result, Err(TurnError::Unintelligible)));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn recognizer_failure_cleans_up_the_upload() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), Arc::new(BrokenStt), Arc::new(FixedTts));

    let result = pipeline
        .process(TurnRequest::Audio {
            bytes: wav_bytes(2),
            filename: "clip.wav".to_string(),
        })
        .await;

    match result {
        Err(TurnError::Transcription(detail)) => assert!(detail.contains("recognizer offline")),
        other => panic!("expected Transcription error, got {other:?}"),
    }
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn synthesis_failure_fails_the_turn_after_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        Arc::new(FixedStt("i feel hopeless")),
        Arc::new(BrokenTts),
    );

    let result = pipeline
        .process(TurnRequest::Audio {
            bytes: wav_bytes(2),
            filename: "clip.wav".to_string(),
        })
        .await;

    match result {
        Err(TurnError::Synthesis(detail)) => assert!(detail.contains("engine crashed")),
        other => panic!("expected Synthesis error, got {other:?}"),
    }
    // No partial result, no leftover upload, no stored artifact.
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn overlong_audio_is_rejected_with_the_measured_duration() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        Arc::new(FixedStt("never reached")),
        Arc::new(FixedTts),
    );

    let result = pipeline
        .process(TurnRequest::Audio {
            bytes: wav_bytes(31),
            filename: "long.wav".to_string(),
        })
        .await;

    match result {
        Err(TurnError::Rejected(ValidationRejection::TooLong {
            duration_secs,
            limit_secs,
        })) => {
            assert!(duration_secs > 30.0);
            assert_eq!(limit_secs, 30);
        }
        other => panic!("expected TooLong, got {other:?}"),
    }
    assert!(files_in(dir.path()).is_empty());
}
