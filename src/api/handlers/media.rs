use std::collections::BTreeMap;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, AppQuery, JSend, Page, Pagination};
use crate::assets::{
    AnalyzeApplyReport, AnalyzeReport, AnalyzeSelection, BatchReport, IntegrityReport,
    MetadataPatch, ScanPreview, ScanReport,
};
use crate::config::Config;
use crate::error::ItemFailure;
use crate::storage::models::{MediaFilter, MediaKind, MediaRecord, MediaUpdate, MediaUsage, Patch};
use crate::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub category: Option<String>,
    pub created_at: String,
    pub filename: String,
    pub folder: String,
    pub id: String,
    pub kind: MediaKind,
    pub mime_type: String,
    pub original_name: String,
    pub path: String,
    pub show_in_gallery: bool,
    pub size: u64,
    pub tags: Vec<String>,
    pub updated_at: String,
    pub url: String,
    pub used_in: Vec<MediaUsage>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMediaRequest {
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub alt: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub caption: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub show_in_gallery: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    OriginalName,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Deserialize)]
pub struct ListMediaParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_media_limit")]
    pub limit: u32,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default = "default_sort")]
    pub sort: SortField,
    #[serde(default = "default_order")]
    pub order: SortOrder,
}

#[derive(Debug, Deserialize)]
pub struct GalleryParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_gallery_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    /// Only list images whose name or category would change
    #[serde(default)]
    pub preview: bool,
}

/// Files saved by a multi-file upload, and those that were not.
#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub failed: Vec<ItemFailure>,
    pub items: Vec<MediaResponse>,
}

#[derive(Debug, Serialize)]
pub struct MediaFilters {
    pub categories: Vec<String>,
    pub folders: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub filters: MediaFilters,
    pub items: Vec<MediaResponse>,
    pub pagination: Pagination,
}

fn default_page() -> u32 {
    1
}

fn default_media_limit() -> u32 {
    50
}

fn default_gallery_limit() -> u32 {
    20
}

fn default_sort() -> SortField {
    SortField::CreatedAt
}

fn default_order() -> SortOrder {
    SortOrder::Desc
}

/// Distinguishes between a missing field (`None`) and an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Treat empty query values (`?folder=`) as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// Single-file upload. Route: POST /admin/media/upload (field `file`)
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<MediaResponse>>, ApiError> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("file") {
            upload = Some(read_upload(field, state.config.max_upload_size).await?);
        }
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("file field is required"))?;
    let record = state
        .assets
        .ingest(upload.data, &upload.file_name, &upload.mime_type)
        .await?;

    Ok(JSend::success(media_to_response(&record)))
}

/// Multi-file upload. Route: POST /admin/media (repeated field `files`)
///
/// Each file is ingested on its own. Files that fail are listed by name while
/// the others stay saved; the request only fails when no file could be stored.
pub async fn upload_many_media(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JSend<UploadReport>>), ApiError> {
    let mut uploads = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("files") {
            uploads.push(read_upload(field, state.config.max_upload_size).await?);
        }
    }

    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    let mut report = UploadReport {
        items: Vec::with_capacity(uploads.len()),
        failed: Vec::new(),
    };
    let mut all_rejected = true;

    for upload in uploads {
        match state
            .assets
            .ingest(upload.data, &upload.file_name, &upload.mime_type)
            .await
        {
            Ok(record) => report.items.push(media_to_response(&record)),
            Err(e) => {
                tracing::warn!(file = %upload.file_name, error = %e, "Upload failed");
                all_rejected &= e.is_rejection();
                report.failed.push(ItemFailure {
                    id: upload.file_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    if report.items.is_empty() {
        let reasons: Vec<String> = report
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.id, f.reason))
            .collect();
        let message = format!("No file could be saved: {}", reasons.join("; "));
        return Err(if all_rejected {
            ApiError::bad_request(message)
        } else {
            ApiError::internal(message)
        });
    }

    Ok((StatusCode::CREATED, JSend::success(report)))
}

pub async fn list_media(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListMediaParams>,
) -> Result<Json<JSend<MediaListResponse>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }
    if params.page == 0 {
        return Err(ApiError::bad_request("page must be greater than 0"));
    }

    let filter = MediaFilter {
        search: non_empty(params.search),
        folder: non_empty(params.folder),
        category: non_empty(params.category),
        mime_type: non_empty(params.mime_type),
        gallery_only: false,
    };

    let map_err = |e: crate::storage::DatabaseError| ApiError::internal(e.to_string());
    let mut media = state.db.list_media(&filter).map_err(map_err)?;
    sort_media(&mut media, params.sort, params.order);

    let pagination = Pagination::new(params.page, params.limit, media.len() as u64);
    let items = media
        .iter()
        .skip(pagination.offset())
        .take(params.limit as usize)
        .map(media_to_response)
        .collect();

    let filters = MediaFilters {
        categories: state.db.media_categories().map_err(map_err)?,
        folders: state.db.media_folders().map_err(map_err)?,
    };

    Ok(JSend::success(MediaListResponse {
        filters,
        items,
        pagination,
    }))
}

pub async fn list_folders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<String>>>, ApiError> {
    let folders = state
        .db
        .media_folders()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(JSend::success(folders))
}

pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<MediaResponse>>, ApiError> {
    let record = state.assets.get(&id)?;
    Ok(JSend::success(media_to_response(&record)))
}

pub async fn update_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateMediaRequest>,
) -> Result<Json<JSend<MediaResponse>>, ApiError> {
    let update = MediaUpdate {
        original_name: req.original_name,
        alt: Patch::from(req.alt),
        caption: Patch::from(req.caption),
        category: Patch::from(req.category),
        tags: req.tags,
        folder: req.folder,
        show_in_gallery: req.show_in_gallery,
    };

    if update.is_empty() {
        return Err(ApiError::bad_request(
            "at least one field (original_name, alt, caption, category, tags, folder, show_in_gallery) must be provided",
        ));
    }
    if matches!(update.original_name.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(ApiError::bad_request("original_name must not be empty"));
    }

    let record = state.assets.update_metadata(&id, &update)?;
    Ok(JSend::success(media_to_response(&record)))
}

pub async fn batch_update_media(
    State(state): State<Arc<AppState>>,
    AppJson(updates): AppJson<BTreeMap<String, MetadataPatch>>,
) -> Json<JSend<BatchReport>> {
    let report = state.assets.batch_update_metadata(updates);
    tracing::debug!(
        success = report.success,
        failed = report.failed,
        "Batch media update"
    );
    JSend::success(report)
}

pub async fn check_media(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<IntegrityReport>>, ApiError> {
    let report = state.assets.check_integrity().await?;
    if !report.dangling.is_empty() {
        tracing::warn!(dangling = report.dangling.len(), "Media records without files");
    }
    Ok(JSend::success(report))
}

pub async fn scan_preview(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<ScanPreview>>, ApiError> {
    Ok(JSend::success(state.assets.scan_preview().await?))
}

pub async fn scan_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<ScanReport>>, ApiError> {
    Ok(JSend::success(state.assets.scan_import().await?))
}

/// Filing suggestions for images. Route: GET /admin/media/analyze
pub async fn analyze_media(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<AnalyzeParams>,
) -> Result<Json<JSend<AnalyzeReport>>, ApiError> {
    Ok(JSend::success(state.assets.analyze_preview(params.preview)?))
}

/// Route: POST /admin/media/analyze
pub async fn apply_media_analysis(
    State(state): State<Arc<AppState>>,
    AppJson(selection): AppJson<AnalyzeSelection>,
) -> Result<Json<JSend<AnalyzeApplyReport>>, ApiError> {
    Ok(JSend::success(state.assets.analyze_apply(&selection)?))
}

/// Public gallery. Route: GET /gallery
pub async fn gallery(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<GalleryParams>,
) -> Result<Json<JSend<Page<MediaResponse>>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }
    if params.page == 0 {
        return Err(ApiError::bad_request("page must be greater than 0"));
    }

    let filter = MediaFilter {
        gallery_only: true,
        ..Default::default()
    };
    let mut media = state
        .db
        .list_media(&filter)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    sort_media(&mut media, SortField::CreatedAt, SortOrder::Desc);

    let pagination = Pagination::new(params.page, params.limit, media.len() as u64);
    let items = media
        .iter()
        .skip(pagination.offset())
        .take(params.limit as usize)
        .map(|m| public_media_response(m, &state.config))
        .collect();

    Ok(JSend::success(Page { items, pagination }))
}

// ============================================================================
// Helpers
// ============================================================================

struct Upload {
    data: Bytes,
    file_name: String,
    mime_type: String,
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, ApiError> {
    multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))
}

async fn read_upload(field: Field<'_>, max_upload_size: u64) -> Result<Upload, ApiError> {
    let file_name = field
        .file_name()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("uploaded file must have a filename"))?;
    let declared = field.content_type().map(|s| s.to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

    if data.len() as u64 > max_upload_size {
        return Err(ApiError::payload_too_large(format!(
            "File exceeds maximum upload size of {max_upload_size} bytes"
        )));
    }

    // Declared Content-Type, else a guess from the filename, else octet-stream
    let mime_type = declared
        .filter(|ct| ct != OCTET_STREAM)
        .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()))
        .unwrap_or_else(|| OCTET_STREAM.to_string());

    Ok(Upload {
        data,
        file_name,
        mime_type,
    })
}

fn sort_media(media: &mut [MediaRecord], field: SortField, order: SortOrder) {
    media.sort_by(|a, b| {
        let ordering = match field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::OriginalName => a
                .original_name
                .to_lowercase()
                .cmp(&b.original_name.to_lowercase()),
            SortField::Size => a.size.cmp(&b.size),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn media_to_response(media: &MediaRecord) -> MediaResponse {
    MediaResponse {
        alt: media.alt.clone(),
        caption: media.caption.clone(),
        category: media.category.clone(),
        created_at: media.created_at.to_rfc3339(),
        filename: media.filename.clone(),
        folder: media.folder.clone(),
        id: media.id.clone(),
        kind: media.kind(),
        mime_type: media.mime_type.clone(),
        original_name: media.original_name.clone(),
        path: media.path.clone(),
        show_in_gallery: media.show_in_gallery,
        size: media.size,
        tags: media.tags.clone(),
        updated_at: media.updated_at.to_rfc3339(),
        url: media.url.clone(),
        used_in: media.used_in.clone(),
    }
}

/// Response for public pages: upload paths point at the CDN when one is configured.
fn public_media_response(media: &MediaRecord, config: &Config) -> MediaResponse {
    let mut response = media_to_response(media);
    response.path = config.public_url(&media.path);
    response.url = config.public_url(&media.url);
    response
}
