//! Filesystem source resolver
//!
//! Resolves a locator that is a local path into a `file://` URL. Only files
//! whose extension maps to an `audio/*` MIME type are accepted, so a cover
//! image or a stray text file dropped into a side never reaches the engine.

use crate::error::{CoreError, Result};
use crate::traits::SourceResolver;
use crate::types::Track;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Resolves filesystem locators, optionally relative to a library root
#[derive(Debug, Clone, Default)]
pub struct FileSourceResolver {
    root: Option<PathBuf>,
}

impl FileSourceResolver {
    /// Resolver for absolute locators (relative ones use the working directory)
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that joins relative locators onto `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn locate(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Check that the file extension maps to an audio MIME type
fn audio_mime(path: &Path) -> Result<mime_guess::Mime> {
    let mime = mime_guess::from_path(path).first().ok_or_else(|| {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        CoreError::UnsupportedMediaType(format!("unknown file type: .{}", ext))
    })?;

    if mime.type_() != mime_guess::mime::AUDIO {
        return Err(CoreError::UnsupportedMediaType(mime.to_string()));
    }

    Ok(mime)
}

#[async_trait]
impl SourceResolver for FileSourceResolver {
    async fn resolve(&self, track: &Track) -> Result<String> {
        let path = self.locate(&track.locator);
        let mime = audio_mime(&path)?;

        let absolute = tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| CoreError::unresolvable(&track.locator, e.to_string()))?;

        let metadata = tokio::fs::metadata(&absolute).await?;
        if !metadata.is_file() {
            return Err(CoreError::unresolvable(&track.locator, "not a regular file"));
        }

        let url = Url::from_file_path(&absolute)
            .map_err(|()| CoreError::unresolvable(&track.locator, "path is not absolute"))?;

        debug!(track = %track.id, %mime, %url, "resolved track source");
        Ok(url.to_string())
    }
}
