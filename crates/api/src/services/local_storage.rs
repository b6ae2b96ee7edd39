//! Filesystem-backed object storage.
//!
//! Objects live at `{root_dir}/objects/{key}` and their metadata at
//! `{root_dir}/meta/{key}.json`. Only the `objects` tree is served by the
//! HTTP layer, under `uploads.public_base_url`.

use async_trait::async_trait;
use domain::models::ObjectMetadata;
use domain::services::{ObjectStorage, UploadError};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

const OBJECTS_DIR: &str = "objects";
const METADATA_DIR: &str = "meta";
const METADATA_SUFFIX: &str = ".json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredMetadata<'a> {
    content_type: &'a str,
    size: usize,
    #[serde(flatten)]
    metadata: &'a ObjectMetadata,
}

pub struct LocalObjectStorage {
    objects: PathBuf,
    metadata: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl AsRef<Path>, public_base_url: &str) -> Self {
        let root = root.as_ref();
        Self {
            objects: Self::public_dir(root),
            metadata: root.join(METADATA_DIR),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory holding the objects themselves; the only part of `root`
    /// that may be served publicly.
    pub fn public_dir(root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(OBJECTS_DIR)
    }

    /// Resolves a key to its object and metadata paths. Keys are relative
    /// `folder/name` paths; anything that could escape the root is rejected.
    fn paths_for(&self, key: &str) -> Result<(PathBuf, PathBuf), UploadError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(UploadError::InvalidName(key.to_string()));
        }
        let object = self.objects.join(relative);
        let metadata = self.metadata.join(format!("{}{}", key, METADATA_SUFFIX));
        Ok((object, metadata))
    }
}

async fn create_parent(path: &Path) -> Result<(), UploadError> {
    match path.parent() {
        Some(parent) => tokio::fs::create_dir_all(parent)
            .await
            .map_err(storage_error),
        None => Ok(()),
    }
}

fn storage_error(e: std::io::Error) -> UploadError {
    UploadError::Storage(e.to_string())
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), UploadError> {
        let (path, meta_path) = self.paths_for(key)?;
        create_parent(&path).await?;
        create_parent(&meta_path).await?;

        tokio::fs::write(&path, bytes).await.map_err(storage_error)?;

        let meta = serde_json::to_vec_pretty(&StoredMetadata {
            content_type,
            size: bytes.len(),
            metadata,
        })
        .map_err(|e| UploadError::Storage(e.to_string()))?;
        tokio::fs::write(&meta_path, meta)
            .await
            .map_err(storage_error)?;

        tracing::debug!(path = %path.display(), "Object written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, UploadError> {
        let (path, meta_path) = self.paths_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(storage_error(e)),
        }
        match tokio::fs::remove_file(&meta_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(storage_error(e)),
        }
        Ok(true)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(&self.public_base_url)?
            .strip_prefix('/')?;
        let key = key.split(['?', '#']).next().unwrap_or_default();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ObjectMetadata {
        ObjectMetadata {
            uploaded_by: "uid-admin".to_string(),
            uploaded_at: "2026-01-05T10:00:00Z".to_string(),
            original_name: "sonrisa.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_put_writes_object_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost/uploads/");

        storage
            .put("gallery/1_sonrisa.jpg", b"jpeg-bytes", "image/jpeg", &metadata())
            .await
            .unwrap();

        let object = dir.path().join("objects/gallery/1_sonrisa.jpg");
        assert_eq!(std::fs::read(&object).unwrap(), b"jpeg-bytes");

        let meta_path = dir.path().join("meta/gallery/1_sonrisa.jpg.json");
        let meta: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&meta_path).unwrap()).unwrap();
        assert_eq!(meta["contentType"], "image/jpeg");
        assert_eq!(meta["uploadedBy"], "uid-admin");
        assert_eq!(meta["originalName"], "sonrisa.jpg");
        assert_eq!(meta["size"], 10);

        let public = LocalObjectStorage::public_dir(dir.path());
        assert!(public.join("gallery/1_sonrisa.jpg").exists());
        assert!(!meta_path.starts_with(&public));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost/uploads");
        storage
            .put("hero/banner.png", b"png", "image/png", &metadata())
            .await
            .unwrap();

        assert!(storage.delete("hero/banner.png").await.unwrap());
        assert!(!storage.delete("hero/banner.png").await.unwrap());
        assert!(!dir.path().join("meta/hero/banner.png.json").exists());
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost/uploads");
        for key in ["../etc/passwd", "/abs/path.png", "gallery/../../x.png", ""] {
            let err = storage
                .put(key, b"x", "image/png", &metadata())
                .await
                .unwrap_err();
            assert!(matches!(err, UploadError::InvalidName(_)), "key {:?}", key);
        }
    }

    #[test]
    fn test_url_key_round_trip() {
        let storage = LocalObjectStorage::new("/tmp/x", "https://cdn.drsmile.co/uploads/");
        let url = storage.public_url("gallery/1_a.jpg");
        assert_eq!(url, "https://cdn.drsmile.co/uploads/gallery/1_a.jpg");
        assert_eq!(storage.key_for_url(&url).as_deref(), Some("gallery/1_a.jpg"));
        assert_eq!(
            storage
                .key_for_url("https://cdn.drsmile.co/uploads/gallery/1_a.jpg?v=2")
                .as_deref(),
            Some("gallery/1_a.jpg")
        );
        assert_eq!(storage.key_for_url("https://elsewhere.com/gallery/1_a.jpg"), None);
        assert_eq!(storage.key_for_url("https://cdn.drsmile.co/uploads/"), None);
    }
}
