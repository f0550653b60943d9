//! Pipeline stages for PDF-to-quiz generation.
//!
//! Each submodule implements one step of the ingestion protocol.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ conversation ──▶ parse
//! (path/URL) (pdfium)   (data turns,     (fences, JSON,
//!                        EOD request)     validation)
//! ```
//!
//! 1. [`input`]        — read a local path or download a URL, check `%PDF`
//! 2. [`extract`]      — per-page text of one file; runs in `spawn_blocking`
//! 3. [`conversation`] — the stateful model dialogue; the only stage with
//!    network I/O
//! 4. [`parse`]        — strip code fences, deserialise and validate the
//!    final reply
//!
//! The orchestration (priming, ordering, retries, timeouts, cancellation)
//! lives in [`crate::generate`].

pub mod conversation;
pub mod extract;
pub mod input;
pub mod parse;
