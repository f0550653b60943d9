//! Input resolution: turn a user-supplied path or URL into an [`UploadedFile`].
//!
//! Local files are read whole; URLs are downloaded into memory with a
//! timeout. Either way the `%PDF` magic bytes are checked before the file is
//! handed to the upload batch, so non-PDF input is refused up front instead
//! of failing later inside pdfium.

use crate::error::QuizError;
use crate::upload::UploadedFile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory PDF.
///
/// If the input is a URL, download it. If the input is a local file,
/// validate it exists and is readable. Anything known to exceed
/// `max_file_size` is refused before its body is read.
pub async fn resolve_upload(
    input: &str,
    timeout_secs: u64,
    max_file_size: u64,
) -> Result<UploadedFile, QuizError> {
    if is_url(input) {
        download_url(input, timeout_secs, max_file_size).await
    } else {
        read_local(input, max_file_size).await
    }
}

fn io_error(path: PathBuf, e: std::io::Error) -> QuizError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        QuizError::PermissionDenied { path }
    } else {
        QuizError::FileNotFound { path }
    }
}

/// Read a local file, validating existence, size and PDF magic bytes.
async fn read_local(path_str: &str, max_file_size: u64) -> Result<UploadedFile, QuizError> {
    let path = PathBuf::from(path_str);
    let name = file_name(&path);

    let size = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta.len(),
        Err(e) => return Err(io_error(path, e)),
    };
    check_size(&name, size, max_file_size)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => return Err(io_error(path, e)),
    };
    check_size(&name, bytes.len() as u64, max_file_size)?;
    check_magic(&name, &bytes)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(UploadedFile::new(name, bytes))
}

/// Download a URL into memory.
async fn download_url(
    url: &str,
    timeout_secs: u64,
    max_file_size: u64,
) -> Result<UploadedFile, QuizError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| QuizError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            QuizError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            QuizError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(QuizError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = url_file_name(url);
    if let Some(len) = response.content_length() {
        check_size(&name, len, max_file_size)?;
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| QuizError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_size(&name, bytes.len() as u64, max_file_size)?;
    check_magic(&name, &bytes)?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(UploadedFile::new(name, bytes.to_vec()))
}

fn check_size(name: &str, size: u64, max: u64) -> Result<(), QuizError> {
    if size > max {
        return Err(QuizError::FileTooLarge {
            name: name.to_string(),
            size,
            max,
        });
    }
    Ok(())
}

/// Refuse anything that does not start with `%PDF`, including files too
/// short to hold the header.
fn check_magic(name: &str, bytes: &[u8]) -> Result<(), QuizError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(QuizError::NotAPdf {
            name: name.to_string(),
            magic,
        });
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract a reasonable file name from the URL path.
fn url_file_name(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LIMIT: u64 = 10_240_000;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn url_names() {
        assert_eq!(url_file_name("https://x.org/papers/notes.pdf"), "notes.pdf");
        assert_eq!(url_file_name("https://x.org/pdf/1706"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn reads_local_pdf() {
        let mut tmp = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .expect("tempfile");
        tmp.write_all(b"%PDF-1.7\n%fake body").expect("write");

        let file = resolve_upload(tmp.path().to_str().unwrap(), 5, LIMIT)
            .await
            .expect("valid pdf");
        assert!(file.name().ends_with(".pdf"));
        assert_eq!(file.size(), 19);
    }

    #[tokio::test]
    async fn rejects_non_pdf() {
        let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
        tmp.write_all(b"PK\x03\x04zip data").expect("write");

        let err = resolve_upload(tmp.path().to_str().unwrap(), 5, LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[tokio::test]
    async fn rejects_files_shorter_than_header() {
        for body in [&b""[..], &b"PK"[..], &b"%PD"[..]] {
            let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
            tmp.write_all(body).expect("write");

            let err = resolve_upload(tmp.path().to_str().unwrap(), 5, LIMIT)
                .await
                .unwrap_err();
            let mut expected = [0u8; 4];
            expected[..body.len()].copy_from_slice(body);
            assert!(
                matches!(err, QuizError::NotAPdf { magic, .. } if magic == expected),
                "{} bytes: got {err:?}",
                body.len()
            );
        }
    }

    #[tokio::test]
    async fn oversized_file_rejected_before_read() {
        let mut tmp = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .expect("tempfile");
        tmp.write_all(b"%PDF-1.7\n0123456789").expect("write");

        let err = resolve_upload(tmp.path().to_str().unwrap(), 5, 8)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::FileTooLarge { size: 19, max: 8, .. }));
    }

    #[test]
    fn check_magic_accepts_exact_header() {
        assert!(check_magic("a.pdf", b"%PDF").is_ok());
    }

    #[tokio::test]
    async fn missing_file() {
        let err = resolve_upload("/definitely/not/here.pdf", 5, LIMIT).await.unwrap_err();
        assert!(matches!(err, QuizError::FileNotFound { .. }));
    }
}
