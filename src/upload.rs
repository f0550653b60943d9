//! The upload batch: the set of PDF files a quiz will be generated from.
//!
//! A batch holds at most `max_files` distinct files, each at most
//! `max_file_size` bytes. Offering more files than fit never queues them:
//! every refused file comes back as an [`UploadRejection`] the front end
//! shows as a warning, and the batch itself stays valid.

use crate::config::QuizConfig;
use thiserror::Error;
use tracing::{debug, warn};

/// One uploaded document, held in memory.
///
/// Two files are the same file when their names are equal.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Why a file offered to [`UploadBatch::accept`] was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("'{name}' is {size} bytes (limit {max} bytes)")]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("Exceeded maximum files: {max} ('{name}' was not added)")]
    BatchFull { name: String, max: usize },

    #[error("'{name}' is already in the batch")]
    Duplicate { name: String },
}

/// Capped, de-duplicated list of files in upload order.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    files: Vec<UploadedFile>,
    max_files: usize,
    max_file_size: u64,
}

impl UploadBatch {
    pub fn new(max_files: usize, max_file_size: u64) -> Self {
        Self {
            files: Vec::with_capacity(max_files),
            max_files,
            max_file_size,
        }
    }

    /// An empty batch using the limits from `config`.
    pub fn from_config(config: &QuizConfig) -> Self {
        Self::new(config.max_files, config.max_file_size)
    }

    /// Add `offered` files in order, returning every file that was refused.
    ///
    /// Oversized files are refused first, then duplicates, then anything
    /// past the file cap.
    pub fn accept(
        &mut self,
        offered: impl IntoIterator<Item = UploadedFile>,
    ) -> Vec<UploadRejection> {
        let mut rejections = Vec::new();

        for file in offered {
            let rejection = if file.size() > self.max_file_size {
                Some(UploadRejection::TooLarge {
                    name: file.name.clone(),
                    size: file.size(),
                    max: self.max_file_size,
                })
            } else if self.contains(&file.name) {
                Some(UploadRejection::Duplicate {
                    name: file.name.clone(),
                })
            } else if self.is_full() {
                Some(UploadRejection::BatchFull {
                    name: file.name.clone(),
                    max: self.max_files,
                })
            } else {
                None
            };

            match rejection {
                Some(r) => {
                    warn!("Upload rejected: {}", r);
                    rejections.push(r);
                }
                None => {
                    debug!("Accepted '{}' ({})", file.name, format_file_size(file.size()));
                    self.files.push(file);
                }
            }
        }

        rejections
    }

    /// Remove the file called `name`, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<UploadedFile> {
        let idx = self.files.iter().position(|f| f.name == name)?;
        Some(self.files.remove(idx))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.files.len() >= self.max_files
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(UploadedFile::size).sum()
    }
}

/// Human-readable size, e.g. `"1.50 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} Bytes");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
