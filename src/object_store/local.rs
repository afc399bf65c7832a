use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{ObjectInfo, ObjectStore, ObjectStoreError};

/// Filesystem object store rooted at the asset root.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Resolve a key to an absolute path under the root.
    /// Purely lexical: nothing on disk is touched before the key is accepted.
    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        normalize_key(key).map(|relative| self.base_path.join(relative))
    }
}

/// Normalize a slash-separated key, resolving `.` and `..` segments.
/// Keys that would climb above the root, are absolute, or carry characters
/// with platform-specific path meaning are rejected.
pub(crate) fn normalize_key(key: &str) -> Result<PathBuf, ObjectStoreError> {
    if key.contains('\0') || key.contains('\\') {
        return Err(ObjectStoreError::InvalidKey(key.to_string()));
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(key).components() {
        match component {
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(ObjectStoreError::InvalidKey(key.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ObjectStoreError::InvalidKey(key.to_string()));
            }
        }
    }
    Ok(normalized)
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put_new(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ObjectStoreError::InvalidKey(key.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers never observe a partially written object: the bytes land in a
        // hidden sibling first and are linked into place once complete.
        let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));
        let linked = match tokio::fs::write(&tmp, &data).await {
            Ok(()) => tokio::fs::hard_link(&tmp, &path).await,
            Err(e) => Err(e),
        };
        // The temporary file goes away whatever happened above
        match tokio::fs::remove_file(&tmp).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %tmp.display(), error = %e, "Failed to remove temporary upload")
            }
        }

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(ObjectStoreError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(key)?;
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(ObjectStoreError::NotAFile(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let path = self.object_path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(m) => Ok(m.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<ObjectInfo>, ObjectStoreError> {
        let mut objects = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                // Temporary upload files
                if name.starts_with('.') {
                    continue;
                }
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    let path = entry.path();
                    let relative = match path.strip_prefix(&self.base_path) {
                        Ok(r) => r,
                        Err(_) => continue,
                    };
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    let size = entry.metadata().await?.len();
                    objects.push(ObjectInfo { key, size });
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}
