//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::QuizConfigBuilder::progress_callback`] to receive events
//! as the pipeline sends each file and each end-of-data request. A front end
//! uses them for the "Processing file i / N" and "Generating quiz" labels.
//!
//! # Example
//!
//! ```rust
//! use pdf_quiz::{GenerationProgressCallback, QuizConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FileCounter {
//!     sent: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for FileCounter {
//!     fn on_file_sent(&self, file_num: usize, total_files: usize, payload_len: usize) {
//!         self.sent.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("file {}/{} sent ({} chars)", file_num, total_files, payload_len);
//!     }
//! }
//!
//! let counter = Arc::new(FileCounter { sent: AtomicUsize::new(0) });
//!
//! let config = QuizConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the ingestion pipeline as it works through a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in order from a single task.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before the priming message is sent.
    ///
    /// # Arguments
    /// * `total_files` — number of files in the batch
    fn on_generation_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file's text is extracted and sent.
    ///
    /// # Arguments
    /// * `file_num`    — 1-indexed position in the batch
    /// * `total_files` — number of files in the batch
    fn on_file_start(&self, file_num: usize, total_files: usize) {
        let _ = (file_num, total_files);
    }

    /// Called after a file's payload was accepted by the conversation.
    ///
    /// # Arguments
    /// * `file_num`    — 1-indexed position in the batch
    /// * `total_files` — number of files in the batch
    /// * `payload_len` — byte length of the joined page text
    fn on_file_sent(&self, file_num: usize, total_files: usize, payload_len: usize) {
        let _ = (file_num, total_files, payload_len);
    }

    /// Called before each end-of-data request.
    ///
    /// # Arguments
    /// * `attempt`      — 1-indexed attempt number
    /// * `max_attempts` — attempt budget
    fn on_request_start(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// Called when a reply could not be turned into a question list.
    fn on_attempt_failed(&self, attempt: u32, max_attempts: u32, error: &str) {
        let _ = (attempt, max_attempts, error);
    }

    /// Called once when a valid question list was produced.
    fn on_generation_complete(&self, question_count: usize) {
        let _ = question_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::QuizConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        files: AtomicUsize,
        failures: AtomicUsize,
        questions: AtomicUsize,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_file_sent(&self, _file_num: usize, _total: usize, _len: usize) {
            self.files.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attempt_failed(&self, _attempt: u32, _max: u32, _error: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_complete(&self, question_count: usize) {
            self.questions.store(question_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(2);
        cb.on_file_start(1, 2);
        cb.on_file_sent(1, 2, 42);
        cb.on_request_start(1, 3);
        cb.on_attempt_failed(1, 3, "bad json");
        cb.on_generation_complete(5);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_file_sent(1, 2, 10);
        tracker.on_file_sent(2, 2, 20);
        tracker.on_attempt_failed(1, 3, "bad json");
        tracker.on_generation_complete(4);

        assert_eq!(tracker.files.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.questions.load(Ordering::SeqCst), 4);
    }
}
