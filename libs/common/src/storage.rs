//! Storage module for the public root
//!
//! The public root holds two flat, append-only directories: `uploads/` for
//! raw uploaded images and `downloads/` for generated redirect documents.
//! Files are named from a process-wide monotonic millisecond id and are
//! always opened with create-new semantics, so an existing artifact is
//! never overwritten.

use crate::error::{StorageError, StorageResult};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{self, File, OpenOptions};
use tracing::{debug, info};

/// Number of fresh ids tried before giving up on a directory
const MAX_NAME_ATTEMPTS: usize = 16;

/// One of the two directories under the public root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Raw uploaded images
    Uploads,
    /// Generated redirect documents
    Downloads,
}

impl Area {
    /// Directory name relative to the public root
    pub fn dir_name(self) -> &'static str {
        match self {
            Area::Uploads => "uploads",
            Area::Downloads => "downloads",
        }
    }

    /// Public route prefix the directory is served under
    pub fn route(self) -> &'static str {
        match self {
            Area::Uploads => "/uploads",
            Area::Downloads => "/downloads",
        }
    }
}

/// Millisecond ids that never repeat within the process
///
/// Each id is the current wall-clock time in milliseconds, bumped past the
/// previously issued id when two calls land in the same millisecond.
#[derive(Debug, Default)]
pub struct ArtifactIds {
    last: AtomicU64,
}

impl ArtifactIds {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Issue the next id
    pub fn next(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);

        now.max(previous + 1)
    }
}

/// A freshly created, still empty artifact file
#[derive(Debug)]
pub struct NewArtifact {
    /// Full path on disk
    pub path: PathBuf,
    /// File name inside its area directory
    pub filename: String,
    /// Open handle, positioned at the start
    pub file: File,
}

#[derive(Debug)]
struct Inner {
    root: PathBuf,
    ids: ArtifactIds,
}

/// Handle to the public root and its artifact directories
#[derive(Debug, Clone)]
pub struct PublicStorage {
    inner: Arc<Inner>,
}

impl PublicStorage {
    /// Create a storage handle rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_ids(root, ArtifactIds::new())
    }

    fn with_ids(root: impl Into<PathBuf>, ids: ArtifactIds) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                ids,
            }),
        }
    }

    /// The public root directory
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Directory on disk for an area
    pub fn dir(&self, area: Area) -> PathBuf {
        self.inner.root.join(area.dir_name())
    }

    /// Public URL path of a file stored in an area
    pub fn public_url(&self, area: Area, filename: &str) -> String {
        format!("{}/{}", area.route(), filename)
    }

    /// Create both area directories, including missing parents
    ///
    /// Safe to call when the directories already exist.
    pub async fn ensure_layout(&self) -> StorageResult<()> {
        for area in [Area::Uploads, Area::Downloads] {
            let dir = self.dir(area);
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::io(&dir, e))?;
            info!("Storage directory ready: {}", dir.display());
        }

        Ok(())
    }

    /// Create a new upload file named `<id><extension>`
    ///
    /// `extension` must already include its leading dot, or be empty.
    pub async fn create_upload(&self, extension: &str) -> StorageResult<NewArtifact> {
        self.create_unique(Area::Uploads, |id| format!("{}{}", id, extension))
            .await
    }

    /// Create a new download file named `<prefix><id><suffix>`
    pub async fn create_download(&self, prefix: &str, suffix: &str) -> StorageResult<NewArtifact> {
        self.create_unique(Area::Downloads, |id| format!("{}{}{}", prefix, id, suffix))
            .await
    }

    async fn create_unique<F>(&self, area: Area, name_for: F) -> StorageResult<NewArtifact>
    where
        F: Fn(u64) -> String,
    {
        let dir = self.dir(area);

        for _ in 0..MAX_NAME_ATTEMPTS {
            let filename = name_for(self.inner.ids.next());
            let path = dir.join(&filename);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    return Ok(NewArtifact {
                        path,
                        filename,
                        file,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Artifact name taken, retrying: {}", path.display());
                }
                Err(e) => return Err(StorageError::io(path, e)),
            }
        }

        Err(StorageError::NamesExhausted { dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ids_are_strictly_increasing() {
        let ids = ArtifactIds::new();
        let mut previous = ids.next();
        for _ in 0..1000 {
            let id = ids.next();
            assert!(id > previous, "{} should be greater than {}", id, previous);
            previous = id;
        }
    }

    #[test]
    fn test_ids_continue_past_a_future_value() {
        let ids = ArtifactIds::starting_after(u64::MAX / 2);
        assert_eq!(ids.next(), u64::MAX / 2 + 1);
        assert_eq!(ids.next(), u64::MAX / 2 + 2);
    }

    #[test]
    fn test_area_routes() {
        let storage = PublicStorage::new("public");
        assert_eq!(storage.dir(Area::Uploads), PathBuf::from("public/uploads"));
        assert_eq!(
            storage.dir(Area::Downloads),
            PathBuf::from("public/downloads")
        );
        assert_eq!(
            storage.public_url(Area::Downloads, "portfolio-redirect-1.jpg"),
            "/downloads/portfolio-redirect-1.jpg"
        );
    }

    #[tokio::test]
    async fn test_ensure_layout_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let storage = PublicStorage::new(temp.path().join("nested").join("public"));

        storage.ensure_layout().await.unwrap();
        storage.ensure_layout().await.unwrap();

        assert!(storage.dir(Area::Uploads).is_dir());
        assert!(storage.dir(Area::Downloads).is_dir());
    }

    #[tokio::test]
    async fn test_create_skips_existing_names() {
        let temp = TempDir::new().unwrap();
        let start = u64::MAX / 2;
        let storage = PublicStorage::with_ids(temp.path(), ArtifactIds::starting_after(start));
        storage.ensure_layout().await.unwrap();

        let taken = storage
            .dir(Area::Uploads)
            .join(format!("{}.png", start + 1));
        std::fs::write(&taken, b"existing").unwrap();

        let artifact = storage.create_upload(".png").await.unwrap();
        assert_eq!(artifact.filename, format!("{}.png", start + 2));
        assert_eq!(std::fs::read(&taken).unwrap(), b"existing");
    }

    #[tokio::test]
    async fn test_create_download_names() {
        let temp = TempDir::new().unwrap();
        let storage = PublicStorage::new(temp.path());
        storage.ensure_layout().await.unwrap();

        let first = storage
            .create_download("portfolio-redirect-", ".jpg")
            .await
            .unwrap();
        let second = storage
            .create_download("portfolio-redirect-", ".jpg")
            .await
            .unwrap();

        assert_ne!(first.filename, second.filename);
        assert!(first.filename.starts_with("portfolio-redirect-"));
        assert!(first.filename.ends_with(".jpg"));
        assert!(first.path.exists());
        assert!(second.path.exists());
    }

    #[tokio::test]
    async fn test_create_without_layout_fails_with_io_error() {
        let temp = TempDir::new().unwrap();
        let storage = PublicStorage::new(temp.path().join("missing"));

        let result = storage.create_upload(".png").await;
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }
}
