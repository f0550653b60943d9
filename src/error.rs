//! Error types for the pdf-quiz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`QuizError`] — **Fatal**: the generation attempt cannot proceed at all
//!   (unreadable PDF, provider not configured, every reply malformed, the
//!   caller cancelled). Returned as `Err(QuizError)` from the top-level
//!   `generate*` functions.
//!
//! * [`ReplyError`] — **Non-fatal**: one reply from the model could not be
//!   turned into a valid question list. The end-of-data request is re-sent
//!   and the error is kept in [`crate::output::GenerationStats`] so callers
//!   can see what the model got wrong before it got it right.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-quiz library.
///
/// Per-attempt reply failures use [`ReplyError`] and only surface here,
/// wrapped in [`QuizError::GenerationFailed`], once every attempt is spent.
#[derive(Debug, Error)]
pub enum QuizError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    ///
    /// `magic` holds the first four bytes, zero-padded for shorter files.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    /// The file is larger than the per-file upload limit; it was not read.
    #[error("'{name}' is {size} bytes, over the {max}-byte upload limit")]
    FileTooLarge { name: String, size: u64, max: u64 },

    /// Generation was requested with no files in the upload batch.
    #[error("No files to generate a quiz from; add at least one PDF")]
    EmptyBatch,

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none (or a wrong one) was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// pdfium returned an error while reading the text of a page.
    #[error("Text extraction failed for '{name}' page {page}: {detail}")]
    ExtractionFailed {
        name: String,
        page: usize,
        detail: String,
    },

    /// Text extraction exceeded the configured timeout.
    #[error("Text extraction timed out after {secs}s for '{name}'")]
    ExtractionTimeout { name: String, secs: u64 },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium for your platform, or set PDFIUM_LIB_PATH=/path/to/libpdfium\n\
to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error for a conversation turn.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// A conversation turn exceeded the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// Every end-of-data request produced an unusable reply.
    #[error("Quiz generation failed after {attempts} attempts.\nLast error: {last_error}")]
    GenerationFailed {
        attempts: u32,
        last_error: ReplyError,
    },

    /// The caller cancelled the generation before it finished.
    #[error("Quiz generation was cancelled")]
    Cancelled,

    // ── State errors ──────────────────────────────────────────────────────
    /// An operation was attempted in the wrong application mode.
    #[error("Operation requires {expected} mode")]
    WrongMode { expected: &'static str },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single model reply.
///
/// Any of these triggers a re-send of the end-of-data request until the
/// attempt budget is spent.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ReplyError {
    /// The reply carried no candidate completion at all.
    #[error("reply contained no candidates")]
    NoCandidates,

    /// The reply text is not valid JSON for a question list.
    #[error("reply is not valid JSON: {0}")]
    Json(String),

    /// The reply parsed as JSON but the top level is not an array.
    #[error("reply is not a JSON array")]
    NotAnArray,

    /// The array was empty.
    #[error("reply contained no questions")]
    Empty,

    /// A question has no text.
    #[error("question {index} has empty text")]
    EmptyQuestion { index: usize },

    /// A question offers more choices than allowed.
    #[error("question {index} has {count} choices (maximum {max})")]
    TooManyChoices { index: usize, count: usize, max: usize },

    /// A question offers fewer than two choices.
    #[error("question {index} has {count} choices (minimum 2)")]
    TooFewChoices { index: usize, count: usize },

    /// The stated answer does not appear verbatim among the choices.
    #[error("question {index}: answer {answer:?} is not one of its choices")]
    AnswerNotInChoices { index: usize, answer: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failed_display() {
        let e = QuizError::GenerationFailed {
            attempts: 3,
            last_error: ReplyError::NotAnArray,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 attempts"), "got: {msg}");
        assert!(msg.contains("not a JSON array"), "got: {msg}");
    }

    #[test]
    fn answer_not_in_choices_display() {
        let e = ReplyError::AnswerNotInChoices {
            index: 2,
            answer: "Paris".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("question 2"));
        assert!(msg.contains("\"Paris\""));
    }

    #[test]
    fn timeout_displays() {
        assert!(QuizError::ApiTimeout { secs: 60 }.to_string().contains("60s"));
        let e = QuizError::ExtractionTimeout {
            name: "notes.pdf".into(),
            secs: 5,
        };
        assert!(e.to_string().contains("notes.pdf"));
    }

    #[test]
    fn reply_error_serialises() {
        let e = ReplyError::TooManyChoices {
            index: 0,
            count: 6,
            max: 4,
        };
        let json = serde_json::to_string(&e).expect("serialise");
        let back: ReplyError = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, e);
    }
}
