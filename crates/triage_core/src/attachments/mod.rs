use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, UPLOAD_TOO_LARGE};

pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_EXTENSION_CHARS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAttachment {
    pub file_name: String,
    pub sha256: String,
    pub size_bytes: usize,
    /// Path the server exposes the file under, e.g. `/uploads/<sha>.png`.
    pub url: String,
}

/// Content-addressed attachment storage on the local filesystem.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
    max_bytes: usize,
}

/// Keep a short alphanumeric extension from the client's filename; drop anything else.
fn sanitized_extension(original_name: Option<&str>) -> Option<String> {
    let ext = Path::new(original_name?).extension()?.to_str()?;
    let ok = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_CHARS
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    ok.then(|| ext.to_ascii_lowercase())
}

impl AttachmentStore {
    pub fn new(root: PathBuf, max_bytes: usize) -> Self {
        Self { root, max_bytes }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::new("UPLOAD_STORE_FAILED", "Failed to create uploads directory")
                .with_details(format!("path={}; err={e}", self.root.display()))
        })
    }

    pub fn put(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<StoredAttachment, AppError> {
        if bytes.is_empty() {
            return Err(AppError::validation("Attachment is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::new(
                UPLOAD_TOO_LARGE,
                format!(
                    "File size exceeds maximum allowed size of {} bytes",
                    self.max_bytes
                ),
            )
            .with_details(format!("size={}", bytes.len())));
        }

        self.ensure_dirs()?;

        let sha256 = hex::encode(Sha256::digest(bytes));
        let file_name = match sanitized_extension(original_name) {
            Some(ext) => format!("{sha256}.{ext}"),
            None => sha256.clone(),
        };

        // Same bytes, same name: rewriting an existing file is a no-op in effect.
        let path = self.root.join(&file_name);
        fs::write(&path, bytes).map_err(|e| {
            AppError::new("UPLOAD_STORE_FAILED", "Failed to write attachment")
                .with_details(format!("path={}; err={e}", path.display()))
                .with_retryable(true)
        })?;

        Ok(StoredAttachment {
            url: format!("{PUBLIC_PREFIX}/{file_name}"),
            file_name,
            sha256,
            size_bytes: bytes.len(),
        })
    }
}
