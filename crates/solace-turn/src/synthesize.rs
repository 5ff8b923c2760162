//! Speech synthesis adapter and the reply-audio artifact store.
//!
//! Synthesized replies are the only state that outlives a turn: they are
//! persisted under a fresh UUID for later retrieval by the download
//! endpoint and reaped by a background retention task, never deleted by
//! the orchestrator itself.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use uuid::Uuid;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Content type of stored reply audio.
pub const ARTIFACT_CONTENT_TYPE: &str = "audio/mpeg";

/// Text-to-speech capability producing MPEG audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, String>;
}

/// Synthesizer backed by a gtts-style CLI.
///
/// Invoked as `<binary> - --output -`: the reply text is written to stdin
/// and the MP3 stream is read from stdout.
#[derive(Debug, Clone)]
pub struct TtsCli {
    binary_path: PathBuf,
}

impl TtsCli {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsCli {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, String> {
        let mut child = Command::new(&self.binary_path)
            .arg("-")
            .arg("--output")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn TTS binary: {e}"))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "failed to open stdin".to_string())?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| format!("failed to write to stdin: {e}"))?;
        drop(stdin);

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                )
            })?
            .map_err(|e| format!("failed to read stdout: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("TTS binary failed: {stderr}"));
        }
        if output.stdout.is_empty() {
            return Err("TTS binary produced no audio".to_string());
        }
        Ok(output.stdout)
    }
}

/// A stored synthesized reply.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub id: Uuid,
    pub filename: String,
    pub path: PathBuf,
    pub content_type: &'static str,
}

impl AudioArtifact {
    /// The relative path the caller uses to retrieve the audio.
    pub fn download_path(&self) -> String {
        format!("/download/{}", self.filename)
    }
}

/// Content-addressed storage for synthesized replies.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists MPEG bytes under a fresh UUID filename.
    pub async fn store_mpeg(&self, bytes: &[u8]) -> Result<AudioArtifact, String> {
        let id = Uuid::new_v4();
        let filename = format!("{id}.mp3");
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| format!("failed to store reply audio: {e}"))?;

        Ok(AudioArtifact {
            id,
            filename,
            path,
            content_type: ARTIFACT_CONTENT_TYPE,
        })
    }

    /// Resolves a previously returned filename to its on-disk path.
    ///
    /// Returns `None` for names that could escape the store (path
    /// separators, parent references) — existence is the caller's check.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename.contains("..")
        {
            return None;
        }
        Some(self.dir.join(filename))
    }

    /// Deletes stored artifacts older than `max_age`. Returns how many
    /// were removed.
    pub async fn reap_older_than(&self, max_age: Duration) -> std::io::Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0usize;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_artifact = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
            if !is_artifact {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(_) => continue,
            };

            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age >= max_age {
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
