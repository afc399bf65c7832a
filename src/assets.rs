//! Asset store: ingest uploaded media, resolve it back to bytes, and manage
//! its metadata records.
//!
//! Files live in the object store under `<year>/<month>/<name>_<millis>.<ext>`
//! and records carry the public path `<prefix>/<year>/<month>/...`.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ItemFailure, StoreError};
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::storage::models::{MediaRecord, MediaUpdate, Patch};
use crate::storage::Database;

mod analyze;

pub use analyze::{
    suggest, AnalyzeApplyReport, AnalyzeReport, AnalyzeSelection, AnalyzeStats, AppliedSuggestion,
    NameSuggestion, Suggestion,
};

/// Uploads are never rewritten in place, so clients may cache them forever.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const OCTET_STREAM: &str = "application/octet-stream";
const MAX_BASE_NAME_CHARS: usize = 50;
const SCAN_PREVIEW_LIMIT: usize = 20;

/// Map a file path to a MIME type by extension.
pub fn mime_for_path(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path);
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return OCTET_STREAM,
    };
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        _ => OCTET_STREAM,
    }
}

fn has_known_mime(path: &str) -> bool {
    mime_for_path(path) != OCTET_STREAM
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build the stored filename for an upload: the base name is sanitized to
/// `[A-Za-z0-9-_]`, cut to 50 characters, and suffixed with the millisecond
/// timestamp before the original extension.
pub fn storage_filename(original_name: &str, timestamp_ms: i64) -> String {
    let (base, ext) = match original_name.rsplit_once('.') {
        Some((base, ext)) if !ext.is_empty() => (base, Some(ext)),
        Some((base, _)) => (base, None),
        None => (original_name, None),
    };
    let base: String = sanitize(base).chars().take(MAX_BASE_NAME_CHARS).collect();
    match ext {
        Some(ext) => format!("{base}_{timestamp_ms}.{}", sanitize(ext)),
        None => format!("{base}_{timestamp_ms}"),
    }
}

/// `<year>/<month>` storage folder for an upload time.
pub fn date_folder(now: DateTime<Utc>) -> String {
    now.format("%Y/%m").to_string()
}

/// WordPress-style resized copies such as `photo-300x200.jpg`.
fn is_thumbnail(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let Some((_, dims)) = stem.rsplit_once('-') else {
        return false;
    };
    let Some((width, height)) = dims.split_once(|c: char| c == 'x' || c == 'X') else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    digits(width) && digits(height)
}

/// Bytes of a resolved asset plus the headers needed to serve them.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub data: Bytes,
    pub mime_type: &'static str,
    pub cache_control: &'static str,
}

/// Metadata accepted per item by a batch update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataPatch {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<MetadataPatch> for MediaUpdate {
    fn from(patch: MetadataPatch) -> Self {
        MediaUpdate {
            tags: patch.tags,
            alt: patch.alt.map(Patch::Value).unwrap_or_default(),
            category: patch.category.map(Patch::Value).unwrap_or_default(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub success: u64,
    pub failed: u64,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DanglingMedia {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub total: u64,
    pub valid: u64,
    pub dangling: Vec<DanglingMedia>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanPreview {
    pub total_files: u64,
    pub filtered_files: u64,
    pub thumbnails_skipped: u64,
    pub preview: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub imported: u64,
    pub skipped: u64,
    pub errors: u64,
    pub total: u64,
}

/// The asset store. Cheap to clone; all clones share the database and object store.
#[derive(Clone)]
pub struct AssetStore {
    db: Database,
    objects: Arc<dyn ObjectStore>,
    url_prefix: String,
}

impl AssetStore {
    pub fn new(db: Database, objects: Arc<dyn ObjectStore>, url_prefix: impl Into<String>) -> Self {
        Self {
            db,
            objects,
            url_prefix: url_prefix.into(),
        }
    }

    fn public_path(&self, key: &str) -> String {
        format!("{}/{key}", self.url_prefix)
    }

    /// Object store key of a public path, if the path lives under the upload prefix.
    fn key_for_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.url_prefix.as_str())?
            .strip_prefix('/')
    }

    /// Store an upload and create its record.
    pub async fn ingest(
        &self,
        data: Bytes,
        original_name: &str,
        mime_type: &str,
    ) -> Result<MediaRecord, StoreError> {
        self.ingest_at(Utc::now(), data, original_name, mime_type).await
    }

    /// Ingest with an explicit upload time (drives folder and filename).
    pub async fn ingest_at(
        &self,
        now: DateTime<Utc>,
        data: Bytes,
        original_name: &str,
        mime_type: &str,
    ) -> Result<MediaRecord, StoreError> {
        if data.is_empty() {
            return Err(StoreError::rejected("file must not be empty"));
        }

        let folder = date_folder(now);
        let filename = storage_filename(original_name, now.timestamp_millis());
        let key = format!("{folder}/{filename}");
        let size = data.len() as u64;

        // Phase 1: bytes on disk. A record must never point at a missing file.
        self.objects.put_new(&key, data).await?;

        // Phase 2: metadata record
        let path = self.public_path(&key);
        let record = MediaRecord {
            id: uuid::Uuid::new_v4().to_string(),
            filename,
            mime_type: mime_type.to_string(),
            size,
            path: path.clone(),
            url: path,
            created_at: now,
            updated_at: now,
            original_name: original_name.to_string(),
            alt: None,
            caption: None,
            category: None,
            tags: Vec::new(),
            folder: format!("/{folder}"),
            used_in: Vec::new(),
            show_in_gallery: false,
        };

        if let Err(e) = self.db.put_media(&record) {
            // Best-effort cleanup of the orphaned file
            if let Err(cleanup) = self.objects.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }

        tracing::debug!(media_id = %record.id, path = %record.path, size, "Ingested media");
        Ok(record)
    }

    /// Look up a record without touching its file.
    pub fn find(&self, id: &str) -> Result<Option<MediaRecord>, StoreError> {
        Ok(self.db.get_media(id)?)
    }

    pub fn get(&self, id: &str) -> Result<MediaRecord, StoreError> {
        self.find(id)?
            .ok_or_else(|| StoreError::not_found("Media not found"))
    }

    /// Resolve a record id to the bytes of its file.
    pub async fn resolve(&self, id: &str) -> Result<ResolvedAsset, StoreError> {
        let record = self.get(id)?;

        let Some(key) = self.key_for_path(&record.path) else {
            tracing::warn!(media_id = %id, path = %record.path, "Media path is outside the upload root");
            return Err(StoreError::not_found("Media file not found"));
        };

        let data = match self.objects.get(key).await {
            Ok(data) => data,
            Err(ObjectStoreError::NotFound(_)) | Err(ObjectStoreError::NotAFile(_)) => {
                tracing::warn!(media_id = %id, path = %record.path, "Media record points at a missing file");
                return Err(StoreError::not_found("Media file not found"));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ResolvedAsset {
            data,
            mime_type: mime_for_path(&record.path),
            cache_control: IMMUTABLE_CACHE_CONTROL,
        })
    }

    /// Resolve a path relative to the asset root. Paths escaping the root are
    /// rejected before the filesystem is consulted.
    pub async fn resolve_by_path(&self, relative: &str) -> Result<ResolvedAsset, StoreError> {
        let data = self.objects.get(relative).await.map_err(|e| match e {
            ObjectStoreError::InvalidKey(_) => {
                tracing::warn!(path = %relative, "Rejected path outside the upload root");
                StoreError::rejected("Invalid path")
            }
            ObjectStoreError::NotAFile(_) => StoreError::rejected("Not a file"),
            ObjectStoreError::NotFound(_) => StoreError::not_found("File not found"),
            other => other.into(),
        })?;

        Ok(ResolvedAsset {
            data,
            mime_type: mime_for_path(relative),
            cache_control: IMMUTABLE_CACHE_CONTROL,
        })
    }

    /// Update the editable fields of one record.
    pub fn update_metadata(
        &self,
        id: &str,
        update: &MediaUpdate,
    ) -> Result<MediaRecord, StoreError> {
        if update.is_empty() {
            return Err(StoreError::rejected("no updatable field provided"));
        }
        let record = self
            .db
            .update_media(id, update)?
            .ok_or_else(|| StoreError::not_found("Media not found"))?;
        tracing::debug!(media_id = %id, "Updated media metadata");
        Ok(record)
    }

    /// Apply metadata patches independently; failures are reported per id.
    pub fn batch_update_metadata(&self, updates: BTreeMap<String, MetadataPatch>) -> BatchReport {
        let mut report = BatchReport::default();

        for (id, patch) in updates {
            let update = MediaUpdate::from(patch);
            let outcome = if update.is_empty() {
                // Nothing to change, but the record must still exist
                self.get(&id).map(|_| ())
            } else {
                self.update_metadata(&id, &update).map(|_| ())
            };

            match outcome {
                Ok(()) => report.success += 1,
                Err(e) => {
                    tracing::warn!(media_id = %id, error = %e, "Batch metadata update failed");
                    report.failed += 1;
                    report.errors.push(ItemFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Report records whose file is missing under the asset root.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, StoreError> {
        let mut report = IntegrityReport::default();

        for record in self.db.get_all_media()? {
            report.total += 1;
            let present = match self.key_for_path(&record.path) {
                Some(key) => match self.objects.exists(key).await {
                    Ok(present) => present,
                    Err(ObjectStoreError::InvalidKey(_)) => false,
                    Err(e) => return Err(e.into()),
                },
                None => false,
            };

            if present {
                report.valid += 1;
            } else {
                report.dangling.push(DanglingMedia {
                    id: record.id,
                    path: record.path,
                });
            }
        }

        Ok(report)
    }

    /// Dry run of [`AssetStore::scan_import`]: counts files without writing records.
    pub async fn scan_preview(&self) -> Result<ScanPreview, StoreError> {
        let files: Vec<String> = self
            .objects
            .list()
            .await?
            .into_iter()
            .map(|o| o.key)
            .filter(|key| has_known_mime(key))
            .collect();

        let kept: Vec<String> = files
            .iter()
            .filter(|key| !is_thumbnail(key.rsplit('/').next().unwrap_or(key)))
            .cloned()
            .collect();

        Ok(ScanPreview {
            total_files: files.len() as u64,
            filtered_files: kept.len() as u64,
            thumbnails_skipped: (files.len() - kept.len()) as u64,
            preview: kept.into_iter().take(SCAN_PREVIEW_LIMIT).collect(),
        })
    }

    /// Create records for media files already under the asset root that have none.
    pub async fn scan_import(&self) -> Result<ScanReport, StoreError> {
        let objects = self.objects.list().await?;
        let mut report = ScanReport::default();
        let now = Utc::now();

        for object in objects.into_iter().filter(|o| has_known_mime(&o.key)) {
            report.total += 1;
            let (dir, filename) = match object.key.rsplit_once('/') {
                Some((dir, name)) => (Some(dir), name),
                None => (None, object.key.as_str()),
            };
            let path = self.public_path(&object.key);

            if is_thumbnail(filename) {
                report.skipped += 1;
                continue;
            }

            match self.db.media_path_exists(&path) {
                Ok(true) => {
                    report.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Failed to check existing media");
                    report.errors += 1;
                    continue;
                }
            }

            let record = MediaRecord {
                id: uuid::Uuid::new_v4().to_string(),
                filename: filename.to_string(),
                mime_type: mime_for_path(filename).to_string(),
                size: object.size,
                path: path.clone(),
                url: path.clone(),
                created_at: now,
                updated_at: now,
                original_name: filename.to_string(),
                alt: None,
                caption: None,
                category: None,
                tags: vec!["import".to_string()],
                folder: dir.map(|d| format!("/{d}")).unwrap_or_else(|| "/".to_string()),
                used_in: Vec::new(),
                show_in_gallery: false,
            };

            match self.db.put_media(&record) {
                Ok(()) => report.imported += 1,
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Failed to import media");
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            errors = report.errors,
            "Media scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::LocalStore;
    use chrono::TimeZone;

    fn test_store(dir: &tempfile::TempDir) -> AssetStore {
        let db = Database::open(dir.path().join("data")).unwrap();
        let objects = LocalStore::new(dir.path().join("uploads")).unwrap();
        AssetStore::new(db, Arc::new(objects), "/uploads")
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("a/b/photo.JPG"), "image/jpeg");
        assert_eq!(mime_for_path("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for_path("logo.svg"), "image/svg+xml");
        assert_eq!(mime_for_path("clip.webm"), "video/webm");
        assert_eq!(mime_for_path("song.mp3"), "audio/mpeg");
        assert_eq!(mime_for_path("doc.pdf"), "application/pdf");
        assert_eq!(mime_for_path("notes.txt"), "application/octet-stream");
        assert_eq!(mime_for_path("no-extension"), "application/octet-stream");
    }

    #[test]
    fn test_storage_filename_sanitizes_and_suffixes() {
        assert_eq!(
            storage_filename("My Photo!.PNG", 1_720_000_000_000),
            "My_Photo__1720000000000.PNG"
        );
        assert_eq!(storage_filename("archive.tar.gz", 5), "archive_tar_5.gz");
        assert_eq!(storage_filename("README", 7), "README_7");
    }

    #[test]
    fn test_storage_filename_truncates_base() {
        let long = format!("{}.png", "a".repeat(80));
        let name = storage_filename(&long, 1);
        assert_eq!(name, format!("{}_1.png", "a".repeat(50)));
    }

    #[test]
    fn test_storage_filename_neutralizes_separators_in_extension() {
        let name = storage_filename("x.png/../../y", 1);
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_is_thumbnail() {
        assert!(is_thumbnail("photo-300x200.jpg"));
        assert!(is_thumbnail("photo-1024X768.PNG"));
        assert!(!is_thumbnail("photo.jpg"));
        assert!(!is_thumbnail("my-photo.jpg"));
        assert!(!is_thumbnail("photo-300x.jpg"));
    }

    #[tokio::test]
    async fn test_ingest_july_2024_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let now = Utc.with_ymd_and_hms(2024, 7, 14, 10, 30, 0).unwrap();
        let ts = now.timestamp_millis();

        let record = store
            .ingest_at(now, Bytes::from_static(b"\x89PNG"), "My Photo!.PNG", "image/png")
            .await
            .unwrap();

        assert_eq!(record.folder, "/2024/07");
        assert_eq!(record.filename, format!("My_Photo__{ts}.PNG"));
        assert_eq!(record.path, format!("/uploads/2024/07/My_Photo__{ts}.PNG"));
        assert_eq!(record.url, record.path);
        assert_eq!(record.original_name, "My Photo!.PNG");
        assert_eq!(record.size, 4);
        assert!(!record.show_in_gallery);
        assert!(record.tags.is_empty());
        assert!(dir
            .path()
            .join("uploads/2024/07")
            .join(&record.filename)
            .is_file());
    }

    #[tokio::test]
    async fn test_ingest_then_resolve_returns_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let payload = Bytes::from_static(b"GIF89a-not-really");

        let record = store
            .ingest(payload.clone(), "poster.gif", "image/gif")
            .await
            .unwrap();
        let resolved = store.resolve(&record.id).await.unwrap();

        assert_eq!(resolved.data, payload);
        assert_eq!(resolved.mime_type, "image/gif");
        assert_eq!(resolved.cache_control, IMMUTABLE_CACHE_CONTROL);
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);

        let err = store
            .ingest(Bytes::new(), "empty.png", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.db.get_all_media().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_same_millisecond_collision_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();

        let first = store
            .ingest_at(now, Bytes::from_static(b"first"), "img.png", "image/png")
            .await
            .unwrap();
        let second = store
            .ingest_at(now, Bytes::from_static(b"second"), "img.png", "image/png")
            .await;

        assert!(matches!(second, Err(StoreError::ObjectStore(_))));
        let resolved = store.resolve(&first.id).await.unwrap();
        assert_eq!(resolved.data, Bytes::from_static(b"first"));
        assert_eq!(store.db.get_all_media().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        assert!(matches!(
            store.resolve("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_dangling_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let record = store
            .ingest(Bytes::from_static(b"data"), "gone.pdf", "application/pdf")
            .await
            .unwrap();

        let key = record.path.trim_start_matches("/uploads/");
        std::fs::remove_file(dir.path().join("uploads").join(key)).unwrap();

        assert!(matches!(
            store.resolve(&record.id).await,
            Err(StoreError::NotFound(_))
        ));

        let report = store.check_integrity().await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.valid, 0);
        assert_eq!(report.dangling[0].id, record.id);
    }

    #[tokio::test]
    async fn test_resolve_by_path_serves_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let record = store
            .ingest(Bytes::from_static(b"RIFF"), "cue.wav", "audio/wav")
            .await
            .unwrap();

        let relative = record.path.trim_start_matches("/uploads/");
        let resolved = store.resolve_by_path(relative).await.unwrap();
        assert_eq!(resolved.data, Bytes::from_static(b"RIFF"));
        assert_eq!(resolved.mime_type, "audio/wav");
    }

    #[tokio::test]
    async fn test_resolve_by_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        // A real file just outside the asset root
        std::fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

        for path in ["../secret.txt", "2024/../../secret.txt", "/etc/passwd"] {
            assert!(
                matches!(
                    store.resolve_by_path(path).await,
                    Err(StoreError::Rejected(_))
                ),
                "{path} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_resolve_by_path_directory_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        std::fs::create_dir_all(dir.path().join("uploads/2024/07")).unwrap();

        assert!(matches!(
            store.resolve_by_path("2024/07").await,
            Err(StoreError::Rejected(_))
        ));
        assert!(matches!(
            store.resolve_by_path("2024/07/nope.png").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_update_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let a = store
            .ingest(Bytes::from_static(b"a"), "a.png", "image/png")
            .await
            .unwrap();
        let b = store
            .ingest(Bytes::from_static(b"b"), "b.png", "image/png")
            .await
            .unwrap();

        let mut updates = BTreeMap::new();
        updates.insert(
            a.id.clone(),
            MetadataPatch {
                tags: Some(vec!["festival".to_string()]),
                ..Default::default()
            },
        );
        updates.insert(
            b.id.clone(),
            MetadataPatch {
                alt: Some("Rehearsal".to_string()),
                category: Some("spectacles".to_string()),
                ..Default::default()
            },
        );
        updates.insert(
            "does-not-exist".to_string(),
            MetadataPatch {
                alt: Some("x".to_string()),
                ..Default::default()
            },
        );

        let report = store.batch_update_metadata(updates);
        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].id, "does-not-exist");

        let a = store.get(&a.id).unwrap();
        assert_eq!(a.tags, vec!["festival".to_string()]);
        let b = store.get(&b.id).unwrap();
        assert_eq!(b.alt.as_deref(), Some("Rehearsal"));
        assert_eq!(b.category.as_deref(), Some("spectacles"));
    }

    #[tokio::test]
    async fn test_scan_imports_unindexed_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(root.join("2019/03")).unwrap();
        std::fs::write(root.join("2019/03/affiche.jpg"), b"jpg").unwrap();
        std::fs::write(root.join("2019/03/affiche-300x200.jpg"), b"thumb").unwrap();
        std::fs::write(root.join("2019/03/notes.txt"), b"ignored").unwrap();
        std::fs::write(root.join("logo.png"), b"png").unwrap();

        let preview = store.scan_preview().await.unwrap();
        assert_eq!(preview.total_files, 3);
        assert_eq!(preview.filtered_files, 2);
        assert_eq!(preview.thumbnails_skipped, 1);
        assert!(store.db.get_all_media().unwrap().is_empty());

        let report = store.scan_import().await.unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.total, 3);

        let again = store.scan_import().await.unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped, 3);

        let mut folders = store.db.media_folders().unwrap();
        folders.sort();
        assert_eq!(folders, vec!["/".to_string(), "/2019/03".to_string()]);

        let affiche = store
            .db
            .get_all_media()
            .unwrap()
            .into_iter()
            .find(|m| m.filename == "affiche.jpg")
            .unwrap();
        assert_eq!(affiche.path, "/uploads/2019/03/affiche.jpg");
        assert_eq!(affiche.mime_type, "image/jpeg");
        assert_eq!(affiche.tags, vec!["import".to_string()]);
        assert_eq!(affiche.size, 3);
    }
}
