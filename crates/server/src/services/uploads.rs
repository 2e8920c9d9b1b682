//! Package image uploads.
//!
//! Images are written to the configured upload directory under a unique name
//! and served back from `/static/uploads/`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::UploadConfig;

/// URL prefix uploaded files are served under.
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

/// Accepted image extensions.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request carried no file.
    #[error("No image provided")]
    Missing,

    /// The file name has no accepted image extension.
    #[error("File type not allowed")]
    UnsupportedType,

    /// The file exceeds the configured limit.
    #[error("Image must be smaller than {max} bytes")]
    TooLarge {
        /// Maximum accepted size in bytes.
        max: usize,
    },

    /// Writing the file failed.
    #[error("upload io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded images to disk.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_bytes: config.max_bytes,
        }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Largest accepted file in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Store an image and return the URL it is served from.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` for non-image names,
    /// `UploadError::TooLarge` past the size limit and `UploadError::Io` if
    /// the file cannot be written.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Missing);
        }
        if allowed_extension(original_name).is_none() {
            return Err(UploadError::UnsupportedType);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                max: self.max_bytes,
            });
        }

        let filename = format!("{}_{}", Uuid::new_v4(), secure_filename(original_name));
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        info!(%filename, size = bytes.len(), "Stored upload");
        Ok(format!("{UPLOADS_URL_PREFIX}/{filename}"))
    }
}

/// The lowercased extension of `name`, if it is an accepted image type.
#[must_use]
pub fn allowed_extension(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.into_iter().find(|allowed| *allowed == ext)
}

/// Reduce a client-supplied file name to a safe basename.
///
/// Path components are dropped, whitespace becomes `_`, and anything other
/// than ASCII letters, digits, `.`, `_` and `-` is removed.
#[must_use]
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
