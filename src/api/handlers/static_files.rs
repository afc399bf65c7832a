use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::assets::ResolvedAsset;
use crate::AppState;

/// Serve media content by record id, or redirect to the CDN copy when configured.
/// Route: GET /media/:id
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if state.config.storage.cdn_url.is_some() {
        let record = state.assets.get(&id)?;
        let target = state.config.public_url(&record.url);
        if target.is_empty() {
            return Err(ApiError::not_found("Media URL not found"));
        }
        return Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, target)]).into_response());
    }

    let asset = state.assets.resolve(&id).await?;
    Ok(asset_response(asset))
}

/// Serve a file from under the upload root.
/// Route: GET /uploads/*path
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let asset = state.assets.resolve_by_path(&path).await?;
    Ok(asset_response(asset))
}

fn asset_response(asset: ResolvedAsset) -> Response {
    let length = asset.data.len() as u64;
    let mut response = (StatusCode::OK, asset.data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(asset.mime_type),
    );
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(length));
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static(asset.cache_control),
    );

    response
}
