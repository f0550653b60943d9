//! # pdf-quiz
//!
//! Turn PDF documents into a multiple-choice quiz with a generative
//! language model, then play and score it.
//!
//! ## How it works
//!
//! Instead of asking for a quiz in one oversized prompt, the pipeline holds
//! a single conversation with the model. It first tells the model that bulk
//! data follows and that it must stay quiet until ` END OF DATA `, then sends
//! the extracted text of each PDF as its own turn, and finally asks for the
//! quiz as a bare JSON array. The reply is cleaned, parsed and validated;
//! an unusable reply is re-requested up to three times in total.
//!
//! ```text
//! PDFs
//!  │
//!  ├─ 1. Upload   capped batch (≤ 5 files, ≤ 10 MB each), %PDF check
//!  ├─ 2. Extract  per-page text via pdfium (spawn_blocking)
//!  ├─ 3. Ingest   priming turn, one data turn per file
//!  ├─ 4. Request  END OF DATA + count / difficulty / 4 choices
//!  ├─ 5. Parse    strip fences, JSON, validate answer ∈ choices (retry ×3)
//!  └─ 6. Play     QuizSession: select / advance / retreat / score / redo
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_quiz::{generate_quiz, resolve_upload, CancelToken, QuizConfig, QuizSession, UploadBatch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = QuizConfig::builder().question_count(5).build()?;
//!     let mut batch = UploadBatch::from_config(&config);
//!     batch.accept([resolve_upload("lecture.pdf", 120, config.max_file_size).await?]);
//!
//!     let output = generate_quiz(&batch, &config, &CancelToken::new()).await?;
//!     let mut session = QuizSession::new(output.questions);
//!     while let Some(q) = session.current_question() {
//!         println!("{}", q.question);
//!         session.select_choice(0);
//!         session.advance();
//!     }
//!     println!("{}", session.score().unwrap());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfquiz` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Testing without a model
//!
//! The pipeline only sees the [`TextExtractor`] and [`ConversationFactory`]
//! traits. [`generate_with`] and [`QuizApp::generate`] accept any
//! implementation, so a scripted session can drive every code path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod quiz;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use config::{Difficulty, QuizConfig, QuizConfigBuilder};
pub use error::{QuizError, ReplyError};
pub use generate::{generate_quiz, generate_quiz_sync, generate_with};
pub use output::{GenerationOutput, GenerationStats, Question};
pub use pipeline::conversation::{
    Candidate, ConversationFactory, ConversationReply, ConversationSession, ProviderConversation,
    ProviderConversationFactory,
};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::input::resolve_upload;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use quiz::{QuestionResult, QuizApp, QuizSession, Score, Screen, SessionState};
pub use upload::{format_file_size, UploadBatch, UploadRejection, UploadedFile};
