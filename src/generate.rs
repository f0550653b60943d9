//! Quiz generation entry points: the ingestion protocol.
//!
//! One generation runs one conversation:
//!
//! ```text
//! priming ──▶ file 1 text ──▶ … ──▶ file N text ──▶ END OF DATA request
//!                                                      │      ▲
//!                                                      ▼      │ unusable reply
//!                                                    parse ───┘ (≤ max_attempts)
//! ```
//!
//! Every extraction and every turn is awaited in order, each under its own
//! timeout and raced against the caller's [`CancelToken`]. Only unusable
//! replies are retried, by re-sending the same request on the same session.
//! Everything else aborts the attempt.

use crate::cancel::CancelToken;
use crate::config::QuizConfig;
use crate::error::{QuizError, ReplyError};
use crate::output::{GenerationOutput, GenerationStats};
use crate::pipeline::conversation::{
    ConversationFactory, ConversationReply, ConversationSession, ProviderConversationFactory,
};
use crate::pipeline::extract::{join_pages, PdfiumExtractor, TextExtractor};
use crate::pipeline::parse;
use crate::prompts::{generation_request, PRIMING_PROMPT};
use crate::upload::UploadBatch;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Generate a quiz from `batch` with the provider and extractor from `config`.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - [`QuizError::EmptyBatch`] when the batch has no files
/// - [`QuizError::ProviderNotConfigured`] when no LLM provider can be found
/// - extraction, transport, timeout and cancellation errors, unretried
/// - [`QuizError::GenerationFailed`] after `max_attempts` unusable replies
pub async fn generate_quiz(
    batch: &UploadBatch,
    config: &QuizConfig,
    cancel: &CancelToken,
) -> Result<GenerationOutput, QuizError> {
    if batch.is_empty() {
        return Err(QuizError::EmptyBatch);
    }
    let factory = ProviderConversationFactory::from_config(config)?;
    let extractor = PdfiumExtractor::new(config.password.clone());
    generate_with(batch, config, &factory, &extractor, cancel).await
}

/// Synchronous wrapper around [`generate_quiz`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_quiz_sync(
    batch: &UploadBatch,
    config: &QuizConfig,
) -> Result<GenerationOutput, QuizError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| QuizError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_quiz(batch, config, &CancelToken::new()))
}

/// Run the ingestion protocol with caller-supplied collaborators.
///
/// Opens exactly one session from `factory`; the session is dropped when
/// this function returns, whatever the outcome.
pub async fn generate_with<F, X>(
    batch: &UploadBatch,
    config: &QuizConfig,
    factory: &F,
    extractor: &X,
    cancel: &CancelToken,
) -> Result<GenerationOutput, QuizError>
where
    F: ConversationFactory,
    X: TextExtractor,
{
    let total_start = Instant::now();
    let total_files = batch.len();
    if total_files == 0 {
        return Err(QuizError::EmptyBatch);
    }
    info!(
        "Generating {} {} questions from {} files",
        config.question_count, config.difficulty, total_files
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(total_files);
    }

    let mut stats = GenerationStats::default();
    let mut llm_time = Duration::ZERO;
    let mut extract_time = Duration::ZERO;

    // ── Step 1: Open the session and prime it ────────────────────────────
    let mut session = factory.open()?;
    let turn_start = Instant::now();
    send_turn(&mut session, PRIMING_PROMPT, config, cancel).await?;
    llm_time += turn_start.elapsed();

    // ── Step 2: One data turn per file, in upload order ──────────────────
    for (i, file) in batch.files().iter().enumerate() {
        let file_num = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(file_num, total_files);
        }

        let extract_start = Instant::now();
        let secs = config.extract_timeout_secs;
        let pages = guarded(extractor.extract_pages(file), secs, cancel, || {
            QuizError::ExtractionTimeout {
                name: file.name().to_string(),
                secs,
            }
        })
        .await?;
        extract_time += extract_start.elapsed();

        let payload = join_pages(&pages);
        debug!(
            "Sending data chunk {}/{}: '{}' ({} pages, {} chars)",
            file_num,
            total_files,
            file.name(),
            pages.len(),
            payload.len()
        );

        let turn_start = Instant::now();
        send_turn(&mut session, &payload, config, cancel).await?;
        llm_time += turn_start.elapsed();

        stats.files_sent += 1;
        stats.pages_extracted += pages.len();
        stats.chars_sent += payload.len();

        if let Some(ref cb) = config.progress_callback {
            cb.on_file_sent(file_num, total_files, payload.len());
        }
    }

    // ── Step 3: End-of-data request, retried on unusable replies ─────────
    let request = generation_request(config.question_count, config.difficulty);
    let mut last_err: Option<ReplyError> = None;

    for attempt in 1..=config.max_attempts {
        if let Some(ref cb) = config.progress_callback {
            cb.on_request_start(attempt, config.max_attempts);
        }

        let turn_start = Instant::now();
        let reply = send_turn(&mut session, &request, config, cancel).await?;
        llm_time += turn_start.elapsed();
        stats.attempts = attempt;

        match parse::parse_reply(&reply) {
            Ok(questions) => {
                if questions.len() != config.question_count {
                    warn!(
                        "Requested {} questions, model returned {}",
                        config.question_count,
                        questions.len()
                    );
                }

                stats.extract_duration_ms = extract_time.as_millis() as u64;
                stats.llm_duration_ms = llm_time.as_millis() as u64;
                stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

                info!(
                    "Quiz ready: {} questions after {} attempt(s), {}ms total",
                    questions.len(),
                    attempt,
                    stats.total_duration_ms
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_generation_complete(questions.len());
                }

                return Ok(GenerationOutput { questions, stats });
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} produced an unusable reply: {}",
                    attempt, config.max_attempts, e
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_attempt_failed(attempt, config.max_attempts, &e.to_string());
                }
                stats.failed_attempts.push(e.clone());
                last_err = Some(e);
            }
        }
    }

    Err(QuizError::GenerationFailed {
        attempts: config.max_attempts,
        last_error: last_err.unwrap_or(ReplyError::NoCandidates),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Send one turn under the API timeout and the cancel token.
async fn send_turn<S: ConversationSession>(
    session: &mut S,
    text: &str,
    config: &QuizConfig,
    cancel: &CancelToken,
) -> Result<ConversationReply, QuizError> {
    let secs = config.api_timeout_secs;
    guarded(session.send(text), secs, cancel, || QuizError::ApiTimeout { secs }).await
}

/// Await `fut` unless it exceeds `secs` or `cancel` fires first.
async fn guarded<T, Fut>(
    fut: Fut,
    secs: u64,
    cancel: &CancelToken,
    on_timeout: impl FnOnce() -> QuizError,
) -> Result<T, QuizError>
where
    Fut: Future<Output = Result<T, QuizError>>,
{
    if cancel.is_cancelled() {
        return Err(QuizError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QuizError::Cancelled),
        res = tokio::time::timeout(Duration::from_secs(secs), fut) => match res {
            Ok(inner) => inner,
            Err(_) => Err(on_timeout()),
        },
    }
}
