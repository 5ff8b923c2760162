//! Speech-to-text adapter.
//!
//! Wraps an external recognition capability behind the [`SpeechToText`]
//! trait. The production implementation drives a whisper.cpp-style binary
//! over piped stdio.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// How recognition can fail.
///
/// `NoSpeech` is a caller-facing rejection (the audio carried nothing
/// intelligible); `Backend` is an infrastructure failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SttFailure {
    NoSpeech,
    Backend(String),
}

/// Speech-to-text capability.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribes a complete in-memory audio buffer.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SttFailure>;
}

/// Recognizer backed by a whisper.cpp-style CLI.
///
/// The binary is invoked as `<binary> -m <model> -f -` with the audio
/// bytes written to stdin; the transcription is read from stdout.
#[derive(Debug, Clone)]
pub struct WhisperCliStt {
    binary_path: PathBuf,
    model_path: PathBuf,
}

impl WhisperCliStt {
    pub fn new(binary_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model_path: model_path.into(),
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperCliStt {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SttFailure> {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg("-") // read from stdin
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| SttFailure::Backend(format!("failed to spawn STT binary: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SttFailure::Backend("failed to open stdin".to_string()))?;

        stdin
            .write_all(audio)
            .await
            .map_err(|e| SttFailure::Backend(format!("failed to write to stdin: {e}")))?;
        drop(stdin); // close stdin to signal EOF

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                SttFailure::Backend(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| SttFailure::Backend(format!("failed to read stdout: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SttFailure::Backend(format!("STT binary failed: {stderr}")));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(SttFailure::NoSpeech);
        }
        Ok(text)
    }
}
