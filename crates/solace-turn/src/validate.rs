//! Pre-flight validation of uploaded audio.
//!
//! Checks run cheapest-first: extension, then byte size, then (after the
//! file is materialized, which duration probing requires) the duration
//! bound. The materialized file is wrapped in a [`ScopedAudioFile`] guard
//! that removes it on drop, so every exit path — rejection, transcription
//! failure, success — releases the temp file exactly once.

use crate::config::AudioLimits;
use crate::duration::probe_duration;
use crate::error::{TurnError, ValidationRejection};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Strips path components and shell-hostile characters from a declared
/// filename, keeping only the final component's alphanumerics, dots,
/// dashes, and underscores.
pub fn sanitize_filename(declared: &str) -> String {
    let base = declared
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(declared);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}

/// A materialized upload that deletes itself when dropped.
///
/// The file is named `<uuid>.<ext>` under the upload directory so
/// concurrent turns never collide on disk.
#[derive(Debug)]
pub struct ScopedAudioFile {
    path: PathBuf,
    size_bytes: u64,
    duration_secs: Option<f64>,
    original_filename: String,
}

impl ScopedAudioFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Measured size in MiB, rounded to two decimals.
    pub fn size_mb(&self) -> f64 {
        round2(self.size_bytes as f64 / (1024.0 * 1024.0))
    }

    /// Measured duration in seconds, when the probe succeeded.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// The sanitized filename the caller declared.
    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }
}

impl Drop for ScopedAudioFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp audio file");
            }
        }
    }
}

/// Gates raw audio uploads against the configured bounds.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: AudioLimits,
    upload_dir: PathBuf,
}

impl Validator {
    pub fn new(limits: AudioLimits, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            limits,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn limits(&self) -> &AudioLimits {
        &self.limits
    }

    /// Validates the upload and materializes it to a scoped temp file.
    ///
    /// Check order is extension → size → duration. The duration bound is
    /// skipped (not failed) when the probe cannot determine a duration,
    /// and when `enforce_max_duration` is off.
    pub async fn validate(
        &self,
        bytes: &[u8],
        declared_filename: &str,
    ) -> Result<ScopedAudioFile, TurnError> {
        let sanitized = sanitize_filename(declared_filename);
        let extension = match sanitized.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => {
                return Err(ValidationRejection::BadExtension {
                    extension: String::new(),
                }
                .into())
            }
        };

        if !self.limits.allows_extension(&extension) {
            return Err(ValidationRejection::BadExtension { extension }.into());
        }

        let size_bytes = bytes.len() as u64;
        if size_bytes > self.limits.max_file_size_bytes() {
            return Err(ValidationRejection::TooLarge {
                size_mb: round2(size_bytes as f64 / (1024.0 * 1024.0)),
                limit_mb: self.limits.max_file_size_mb,
            }
            .into());
        }

        let path = self
            .upload_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| TurnError::Storage(format!("failed to store upload: {e}")))?;

        let mut file = ScopedAudioFile {
            path: path.clone(),
            size_bytes,
            duration_secs: None,
            original_filename: sanitized,
        };

        let probe_path = path.clone();
        file.duration_secs = tokio::task::spawn_blocking(move || probe_duration(&probe_path))
            .await
            .map_err(|e| TurnError::Storage(format!("duration probe task failed: {e}")))?;

        if let Some(duration) = file.duration_secs {
            if self.limits.enforce_max_duration && duration > self.limits.max_duration_secs as f64 {
                // `file` drops here and removes the materialized upload.
                return Err(ValidationRejection::TooLong {
                    duration_secs: duration,
                    limit_secs: self.limits.max_duration_secs,
                }
                .into());
            }
        }

        Ok(file)
    }
}
