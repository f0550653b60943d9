//! Configuration types for quiz generation.
//!
//! All generation behaviour is controlled through [`QuizConfig`], built via
//! its [`QuizConfigBuilder`]. The request-shaping parameters (difficulty and
//! question count), the upload limits, the retry budget, the per-call
//! timeouts and the provider selection all live in one struct so a single
//! value describes one generation run.

use crate::error::QuizError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum number of files in one upload batch.
pub const MAX_FILES: usize = 5;

/// Maximum size of one uploaded file in bytes.
pub const MAX_FILE_SIZE: u64 = 10_240_000;

/// Smallest question count a caller may request.
pub const MIN_QUESTIONS: usize = 1;

/// Largest question count a caller may request.
pub const MAX_QUESTIONS: usize = 15;

/// Maximum number of choices per question, sent with every request.
pub const MAX_CHOICES: usize = 4;

/// Total end-of-data requests before generation gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Configuration for one quiz generation.
///
/// Built via [`QuizConfig::builder()`] or using [`QuizConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_quiz::{Difficulty, QuizConfig};
///
/// let config = QuizConfig::builder()
///     .difficulty(Difficulty::Hard)
///     .question_count(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.question_count, 10);
/// ```
#[derive(Clone)]
pub struct QuizConfig {
    /// Requested difficulty. Default: [`Difficulty::Easy`].
    pub difficulty: Difficulty,

    /// Requested number of questions. Range: 1–15. Default: 5.
    ///
    /// This shapes the request only; the model may return a different
    /// number of questions and that reply is still accepted.
    pub question_count: usize,

    /// Maximum number of files in the upload batch. Default: 5.
    pub max_files: usize,

    /// Maximum size of a single uploaded file in bytes. Default: 10 240 000.
    pub max_file_size: u64,

    /// Total end-of-data requests before generation fails. Default: 3.
    ///
    /// Only unusable replies (bad JSON, invalid questions) consume an
    /// attempt. Transport errors and timeouts abort immediately.
    pub max_attempts: u32,

    /// LLM model identifier, e.g. "gemini-2.0-flash", "gpt-4.1-mini".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.5.
    pub temperature: f32,

    /// Maximum tokens the model may generate per turn. Default: 2048.
    ///
    /// Fifteen questions with four choices each serialise to roughly
    /// 1 500 tokens of JSON; a truncated array never parses.
    pub max_tokens: usize,

    /// Per-conversation-turn timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Per-file text extraction timeout in seconds. Default: 120.
    pub extract_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Receiver for per-file and per-attempt progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            question_count: 5,
            max_files: MAX_FILES,
            max_file_size: MAX_FILE_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.5,
            max_tokens: 2048,
            api_timeout_secs: 60,
            extract_timeout_secs: 120,
            download_timeout_secs: 120,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfig")
            .field("difficulty", &self.difficulty)
            .field("question_count", &self.question_count)
            .field("max_files", &self.max_files)
            .field("max_file_size", &self.max_file_size)
            .field("max_attempts", &self.max_attempts)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("extract_timeout_secs", &self.extract_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`QuizConfig`].
#[derive(Debug)]
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl QuizConfigBuilder {
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.config.difficulty = difficulty;
        self
    }

    pub fn question_count(mut self, n: usize) -> Self {
        self.config.question_count = n;
        self
    }

    pub fn max_files(mut self, n: usize) -> Self {
        self.config.max_files = n;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn extract_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extract_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<QuizConfig, QuizError> {
        let c = &self.config;
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&c.question_count) {
            return Err(QuizError::InvalidConfig(format!(
                "Question count must be {MIN_QUESTIONS}–{MAX_QUESTIONS}, got {}",
                c.question_count
            )));
        }
        if c.max_files == 0 || c.max_files > MAX_FILES {
            return Err(QuizError::InvalidConfig(format!(
                "Max files must be 1–{MAX_FILES}, got {}",
                c.max_files
            )));
        }
        if c.max_file_size == 0 {
            return Err(QuizError::InvalidConfig(
                "Max file size must be ≥ 1 byte".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(QuizError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Difficulty requested from the model.
///
/// The value is sent verbatim (`easy`, `medium`, `hard`) in the end-of-data
/// request; nothing checks that the returned questions honour it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Every difficulty in selector order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Lowercase wire name used in the generation request.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(QuizError::InvalidConfig(format!(
                "Unknown difficulty '{other}' (expected easy, medium or hard)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_widget() {
        let c = QuizConfig::default();
        assert_eq!(c.difficulty, Difficulty::Easy);
        assert_eq!(c.question_count, 5);
        assert_eq!(c.max_files, 5);
        assert_eq!(c.max_file_size, 10_240_000);
        assert_eq!(c.max_attempts, 3);
    }

    #[test]
    fn question_count_bounds() {
        assert!(QuizConfig::builder().question_count(0).build().is_err());
        assert!(QuizConfig::builder().question_count(16).build().is_err());
        assert!(QuizConfig::builder().question_count(1).build().is_ok());
        assert!(QuizConfig::builder().question_count(15).build().is_ok());
    }

    #[test]
    fn max_files_cannot_exceed_cap() {
        let err = QuizConfig::builder().max_files(6).build().unwrap_err();
        assert!(err.to_string().contains("Max files"));
    }

    #[test]
    fn attempts_and_timeouts_have_floors() {
        let c = QuizConfig::builder()
            .max_attempts(0)
            .api_timeout_secs(0)
            .extract_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.max_attempts, 1);
        assert_eq!(c.api_timeout_secs, 1);
        assert_eq!(c.extract_timeout_secs, 1);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" medium ".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Easy.to_string(), "easy");
    }

    #[test]
    fn debug_hides_provider() {
        let dbg = format!("{:?}", QuizConfig::default());
        assert!(dbg.contains("question_count: 5"));
    }
}
