//! Text extraction: read the visible text of every page of a PDF.
//!
//! The pipeline only depends on the [`TextExtractor`] trait, so tests (and
//! callers with their own PDF stack) can supply page texts directly. The
//! default [`PdfiumExtractor`] loads the document from memory with
//! `pdfium-render` on a `spawn_blocking` thread, since pdfium is blocking
//! and not async-safe.

use crate::error::QuizError;
use crate::upload::UploadedFile;
use pdfium_render::prelude::*;
use std::future::Future;
use tracing::{debug, info};

/// Produces the ordered page texts of one file.
///
/// Called once per file; the returned vector has one entry per page, in
/// page order. An error aborts the whole generation attempt.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(
        &self,
        file: &UploadedFile,
    ) -> impl Future<Output = Result<Vec<String>, QuizError>> + Send;
}

/// [`TextExtractor`] backed by the pdfium library.
///
/// pdfium is located through `PDFIUM_LIB_PATH` when set, otherwise through
/// the system library search path.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }
}

impl TextExtractor for PdfiumExtractor {
    async fn extract_pages(&self, file: &UploadedFile) -> Result<Vec<String>, QuizError> {
        let name = file.name().to_string();
        let bytes = file.bytes().to_vec();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || extract_blocking(&name, &bytes, password.as_deref()))
            .await
            .map_err(|e| QuizError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

/// Bind to pdfium, preferring an explicit library path.
fn bind_pdfium() -> Result<Pdfium, QuizError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| QuizError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page-text extraction.
fn extract_blocking(
    name: &str,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<Vec<String>, QuizError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                QuizError::PasswordRequired {
                    name: name.to_string(),
                }
            } else {
                QuizError::CorruptPdf {
                    name: name.to_string(),
                    detail: err_str,
                }
            }
        })?;

    let pages = document.pages();
    info!("'{}' loaded: {} pages", name, pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| QuizError::ExtractionFailed {
            name: name.to_string(),
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
        let content = text.all();
        debug!("'{}' page {} → {} chars", name, idx + 1, content.len());
        texts.push(content);
    }

    Ok(texts)
}

/// Join page texts into the payload sent as one conversation turn.
pub fn join_pages(pages: &[String]) -> String {
    pages.join(" ")
}
