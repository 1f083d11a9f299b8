//! Uploaded media on the local filesystem
//!
//! Post images are written under `<root>/posts/` and referenced by their path
//! relative to the root (`posts/<file>`). Name collisions get a short random
//! suffix instead of overwriting the existing file.

use crate::error::{AppError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Sub-directory of the media root holding post images
pub const POST_IMAGE_DIR: &str = "posts";

const MAX_NAME_ATTEMPTS: usize = 8;

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored reference such as `posts/small.gif`.
    pub fn path_of(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }

    /// Store an uploaded post image and return its media reference.
    pub async fn save_post_image(&self, file_name: &str, content: &[u8]) -> Result<String> {
        let dir = self.root.join(POST_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let clean = sanitize_file_name(file_name);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                clean.clone()
            } else {
                with_suffix(&clean, &random_suffix())
            };

            let path = dir.join(&candidate);
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(file = %candidate, "media name taken, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            file.write_all(content).await?;
            file.flush().await?;

            let reference = format!("{}/{}", POST_IMAGE_DIR, candidate);
            info!(reference = %reference, bytes = content.len(), "stored post image");
            return Ok(reference);
        }

        Err(AppError::Media(format!(
            "could not find a free name for {}",
            clean
        )))
    }

    /// Remove a stored file; a missing file is not an error.
    pub async fn remove(&self, reference: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_of(reference)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Keep only the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with `_`.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn random_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..7].to_string()
}

/// `name.ext` + `abc` -> `name_abc.ext`
fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    }
}
