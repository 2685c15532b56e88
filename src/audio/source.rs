//! Where encoded clips come from.
//!
//! Locators have the form `/audio/<prefix>/<path>.<ext>`. The filesystem
//! source resolves them under a local root, the HTTP source appends them to a
//! base URL, and the in-memory source serves fixed bytes for tests.

use crate::error::{Result, TannoyError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fetches the encoded bytes of a clip by locator.
#[async_trait]
pub trait ClipSource: Send + Sync {
    /// # Errors
    /// `FetchFailure` when the clip cannot be retrieved.
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: ClipSource + ?Sized> ClipSource for Arc<T> {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        (**self).fetch(locator).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[async_trait]
impl<T: ClipSource + ?Sized> ClipSource for Box<T> {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        (**self).fetch(locator).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Reads clips from a directory tree mirroring the `/audio/...` layout.
///
/// With root `/srv/tannoy`, locator `/audio/station/atos/anne/via.mp3`
/// resolves to `/srv/tannoy/station/atos/anne/via.mp3`.
#[derive(Debug, Clone)]
pub struct FsClipSource {
    root: PathBuf,
}

impl FsClipSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, locator: &str) -> PathBuf {
        let relative = locator.trim_start_matches('/');
        let relative = relative
            .strip_prefix(crate::defaults::AUDIO_ROOT.trim_start_matches('/'))
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(relative);
        self.root.join(relative)
    }
}

#[async_trait]
impl ClipSource for FsClipSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        let path = self.resolve(locator);
        let inside_root = path.strip_prefix(&self.root).is_ok_and(|relative| {
            relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        });
        if !inside_root {
            return Err(TannoyError::FetchFailure {
                locator: locator.to_string(),
                message: "locator resolves outside the clip root".to_string(),
            });
        }
        tokio::fs::read(&path)
            .await
            .map_err(|e| TannoyError::FetchFailure {
                locator: locator.to_string(),
                message: format!("{}: {e}", path.display()),
            })
    }

    fn describe(&self) -> String {
        format!("filesystem ({})", self.root.display())
    }
}

/// Fetches clips over HTTP from `<base_url><locator>`.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpClipSource {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpClipSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, locator: &str) -> String {
        format!("{}{locator}", self.base_url)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ClipSource for HttpClipSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        let failure = |message: String| TannoyError::FetchFailure {
            locator: locator.to_string(),
            message,
        };

        let response = self
            .client
            .get(self.url(locator))
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failure(format!("server returned {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| failure(format!("failed to read body: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("http ({})", self.base_url)
    }
}

/// In-memory clip source for testing.
#[derive(Debug, Default)]
pub struct MemoryClipSource {
    clips: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    fetches: AtomicUsize,
}

impl MemoryClipSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `locator`.
    pub fn with_clip(mut self, locator: &str, bytes: Vec<u8>) -> Self {
        self.clips.insert(locator.to_string(), bytes);
        self
    }

    /// Make fetching `locator` fail even if it has bytes.
    pub fn with_failure(mut self, locator: &str) -> Self {
        self.failing.insert(locator.to_string());
        self
    }

    /// Hold the response for `locator` back by `delay`.
    pub fn with_delay(mut self, locator: &str, delay: Duration) -> Self {
        self.delays.insert(locator.to_string(), delay);
        self
    }

    /// Number of fetches made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClipSource for MemoryClipSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(locator) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(locator) {
            return Err(TannoyError::FetchFailure {
                locator: locator.to_string(),
                message: "mock fetch failure".to_string(),
            });
        }

        self.clips
            .get(locator)
            .cloned()
            .ok_or_else(|| TannoyError::FetchFailure {
                locator: locator.to_string(),
                message: "not found".to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("memory ({} clips)", self.clips.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_source_strips_audio_root() {
        let source = FsClipSource::new("/srv/tannoy");
        assert_eq!(
            source.resolve("/audio/station/atos/anne/via.mp3"),
            PathBuf::from("/srv/tannoy/station/atos/anne/via.mp3")
        );
    }

    #[test]
    fn fs_source_keeps_other_locators_relative() {
        let source = FsClipSource::new("/srv/tannoy");
        assert_eq!(
            source.resolve("/clips/one.mp3"),
            PathBuf::from("/srv/tannoy/clips/one.mp3")
        );
    }

    #[tokio::test]
    async fn fs_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let clip_dir = dir.path().join("station/atos/anne");
        std::fs::create_dir_all(&clip_dir).unwrap();
        std::fs::write(clip_dir.join("via.mp3"), b"bytes").unwrap();

        let source = FsClipSource::new(dir.path());
        let bytes = source
            .fetch("/audio/station/atos/anne/via.mp3")
            .await
            .unwrap();
        assert_eq!(bytes, b"bytes");
    }

    #[tokio::test]
    async fn fs_source_missing_file_is_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsClipSource::new(dir.path());
        let result = source.fetch("/audio/nope.mp3").await;
        assert!(matches!(result, Err(TannoyError::FetchFailure { .. })));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn fs_source_allows_relative_root_with_parent() {
        let dir = tempfile::tempdir().unwrap();
        let clip_dir = dir.path().join("clips/station");
        std::fs::create_dir_all(&clip_dir).unwrap();
        std::fs::write(clip_dir.join("via.mp3"), [7u8]).unwrap();
        let source = FsClipSource::new(dir.path().join("clips/../clips"));

        let bytes = source.fetch("/audio/station/via.mp3").await.unwrap();
        assert_eq!(bytes, vec![7]);
    }

    #[tokio::test]
    async fn fs_source_refuses_to_leave_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("clips");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.mp3"), [1u8, 2, 3]).unwrap();
        let source = FsClipSource::new(&root);

        let result = source.fetch("/audio/../secret.mp3").await;

        match result {
            Err(TannoyError::FetchFailure { message, .. }) => {
                assert!(message.contains("outside the clip root"));
            }
            other => panic!("Expected FetchFailure, got {other:?}"),
        }
    }

    #[test]
    fn http_source_joins_base_url() {
        let source = HttpClipSource::new("https://example.org/");
        assert_eq!(
            source.url("/audio/station/atos/anne/via.mp3"),
            "https://example.org/audio/station/atos/anne/via.mp3"
        );
    }

    #[tokio::test]
    async fn memory_source_serves_and_counts() {
        let source = MemoryClipSource::new().with_clip("/a.wav", vec![1, 2, 3]);
        assert_eq!(source.fetch("/a.wav").await.unwrap(), vec![1, 2, 3]);
        assert!(source.fetch("/b.wav").await.is_err());
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn memory_source_failure_injection() {
        let source = MemoryClipSource::new()
            .with_clip("/a.wav", vec![1])
            .with_failure("/a.wav");
        match source.fetch("/a.wav").await {
            Err(TannoyError::FetchFailure { locator, message }) => {
                assert_eq!(locator, "/a.wav");
                assert_eq!(message, "mock fetch failure");
            }
            other => panic!("Expected FetchFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn arc_source_delegates() {
        let source: Arc<dyn ClipSource> =
            Arc::new(MemoryClipSource::new().with_clip("/a.wav", vec![9]));
        assert_eq!(source.fetch("/a.wav").await.unwrap(), vec![9]);
        assert!(source.describe().starts_with("memory"));
    }
}
