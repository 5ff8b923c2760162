//! Two-tier sentiment analysis.
//!
//! The primary path is an external pretrained classifier consumed through
//! the [`SentimentModel`] capability. When no model is configured, or the
//! model fails to load or infer, the adapter falls back to a lexical
//! polarity approximation and tags the result `used_fallback` so callers
//! can distinguish the two.

use crate::validate::round2;
use async_trait::async_trait;
use solace_types::{SentimentLabel, SentimentResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Timeout for classifier process execution.
const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Polarity above which text is POSITIVE, below the negation NEGATIVE.
const POLARITY_THRESHOLD: f64 = 0.2;

/// A primary-model judgment: an upper-cased label and a confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelJudgment {
    pub label: String,
    pub score: f32,
}

/// Text-sentiment capability (the primary path).
#[async_trait]
pub trait SentimentModel: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModelJudgment, String>;
}

/// Classifier backed by an external CLI.
///
/// Invoked as `<binary> [--model <path>]` with the text on stdin; expects
/// `LABEL<TAB>score` on stdout. Readiness (the binary exists) is verified
/// once on first use; concurrent first callers share the same
/// initialization and a failed init is retried on the next call.
#[derive(Debug)]
pub struct CliSentimentModel {
    binary_path: PathBuf,
    model_path: Option<PathBuf>,
    ready: OnceCell<()>,
}

impl CliSentimentModel {
    pub fn new(binary_path: impl Into<PathBuf>, model_path: Option<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model_path,
            ready: OnceCell::new(),
        }
    }

    async fn ensure_ready(&self) -> Result<(), String> {
        self.ready
            .get_or_try_init(|| async {
                tokio::fs::metadata(&self.binary_path)
                    .await
                    .map_err(|e| {
                        format!(
                            "classifier binary not found at {}: {e}",
                            self.binary_path.display()
                        )
                    })?;
                if let Some(model) = &self.model_path {
                    tokio::fs::metadata(model)
                        .await
                        .map_err(|e| format!("classifier model not found at {}: {e}", model.display()))?;
                }
                tracing::info!(binary = %self.binary_path.display(), "sentiment classifier ready");
                Ok(())
            })
            .await
            .copied()
    }
}

#[async_trait]
impl SentimentModel for CliSentimentModel {
    async fn classify(&self, text: &str) -> Result<ModelJudgment, String> {
        self.ensure_ready().await?;

        let mut command = Command::new(&self.binary_path);
        if let Some(model) = &self.model_path {
            command.arg("--model").arg(model);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| format!("failed to spawn classifier: {e}"))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "failed to open stdin".to_string())?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| format!("failed to write to stdin: {e}"))?;
        drop(stdin);

        let output = tokio::time::timeout(CLASSIFY_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                format!(
                    "classifier timed out after {} seconds",
                    CLASSIFY_TIMEOUT.as_secs()
                )
            })?
            .map_err(|e| format!("failed to read stdout: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("classifier failed: {stderr}"));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut parts = stdout.split_whitespace();
        let label = parts
            .next()
            .ok_or_else(|| "classifier produced no output".to_string())?
            .to_uppercase();
        let score: f32 = parts
            .next()
            .ok_or_else(|| "classifier produced no score".to_string())?
            .parse()
            .map_err(|e| format!("classifier score not a number: {e}"))?;

        Ok(ModelJudgment {
            label,
            score: score.clamp(0.0, 1.0),
        })
    }
}

/// Small valence lexicon for the fallback path. Values are in [-1, 1].
static LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.9),
    ("angry", -0.7),
    ("anxious", -0.6),
    ("awful", -0.9),
    ("bad", -0.7),
    ("better", 0.5),
    ("calm", 0.4),
    ("depressed", -0.8),
    ("excited", 0.7),
    ("exhausted", -0.6),
    ("fine", 0.3),
    ("glad", 0.6),
    ("good", 0.7),
    ("grateful", 0.8),
    ("great", 0.8),
    ("happy", 0.8),
    ("hate", -0.8),
    ("hopeful", 0.6),
    ("hopeless", -0.8),
    ("hurt", -0.6),
    ("joy", 0.8),
    ("lonely", -0.7),
    ("lost", -0.5),
    ("love", 0.8),
    ("miserable", -0.9),
    ("okay", 0.2),
    ("overwhelmed", -0.6),
    ("peaceful", 0.6),
    ("proud", 0.7),
    ("sad", -0.7),
    ("scared", -0.7),
    ("stressed", -0.6),
    ("terrible", -0.9),
    ("tired", -0.4),
    ("wonderful", 0.9),
    ("worried", -0.6),
    ("worse", -0.6),
    ("worthless", -0.9),
];

/// Tokens that flip the valence of the next scored word.
static NEGATIONS: &[&str] = &["not", "no", "never", "cannot", "cant", "dont", "isnt", "wasnt"];

/// How many tokens a negation reaches forward.
const NEGATION_WINDOW: usize = 3;

fn valence(word: &str) -> Option<f64> {
    LEXICON
        .binary_search_by(|(entry, _)| entry.cmp(&word))
        .ok()
        .map(|index| LEXICON[index].1)
}

/// Computes a signed polarity in [-1, 1]: the mean valence of scored
/// tokens, with negations flipping the sign of the next scored token.
pub fn lexical_polarity(text: &str) -> f64 {
    let tokens: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    let mut sum = 0.0;
    let mut scored = 0usize;
    let mut negate_until: Option<usize> = None;

    for (index, token) in tokens.iter().enumerate() {
        if let Some(limit) = negate_until {
            if index > limit {
                negate_until = None;
            }
        }

        if NEGATIONS.contains(&token.as_str()) {
            negate_until = Some(index + NEGATION_WINDOW);
            continue;
        }

        if let Some(mut value) = valence(token) {
            if negate_until.is_some() {
                value = -value;
                negate_until = None;
            }
            sum += value;
            scored += 1;
        }
    }

    if scored == 0 {
        return 0.0;
    }
    (sum / scored as f64).clamp(-1.0, 1.0)
}

/// Maps a polarity to the fallback sentiment result.
fn fallback_result(polarity: f64) -> SentimentResult {
    let label = if polarity > POLARITY_THRESHOLD {
        SentimentLabel::Positive
    } else if polarity < -POLARITY_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    SentimentResult {
        label,
        score: round2(polarity.abs()) as f32,
        used_fallback: true,
    }
}

/// The sentiment adapter: primary model when available, lexical fallback
/// otherwise. Never fails.
#[derive(Clone)]
pub struct SentimentAnalyzer {
    model: Option<Arc<dyn SentimentModel>>,
}

impl SentimentAnalyzer {
    pub fn new(model: Option<Arc<dyn SentimentModel>>) -> Self {
        Self { model }
    }

    /// Lexical-only deployment.
    pub fn lexical_only() -> Self {
        Self { model: None }
    }

    pub async fn analyze(&self, text: &str) -> SentimentResult {
        if let Some(model) = &self.model {
            match model.classify(text).await {
                Ok(judgment) => match SentimentLabel::parse(&judgment.label) {
                    Some(label) => {
                        return SentimentResult {
                            label,
                            score: judgment.score,
                            used_fallback: false,
                        }
                    }
                    None => {
                        tracing::warn!(label = %judgment.label, "classifier returned unknown label, using fallback");
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "sentiment model failed, using fallback");
                }
            }
        }
        fallback_result(lexical_polarity(text))
    }
}
