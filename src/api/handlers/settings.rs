use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::settings::{PutManyReport, SettingValue};
use crate::storage::models::{SettingKind, SettingRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub created_at: String,
    pub description: Option<String>,
    pub key: String,
    pub kind: SettingKind,
    pub updated_at: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PutSettingRequest {
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SavedSettings {
    pub updated: Vec<String>,
}

/// `Some` whenever the field is in the body, even when it is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Value::deserialize(deserializer)?))
}

// ============================================================================
// Handlers
// ============================================================================

/// Route: GET /settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<BTreeMap<String, SettingValue>>>, ApiError> {
    Ok(JSend::success(state.settings.get_all()?))
}

/// Route: POST /settings
pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<serde_json::Map<String, Value>>,
) -> Result<Json<JSend<SavedSettings>>, ApiError> {
    let report = put_all(&state, body)?;
    Ok(JSend::success(SavedSettings {
        updated: report.updated,
    }))
}

/// Route: GET /settings/:key
pub async fn get_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<JSend<SettingValue>>, ApiError> {
    Ok(JSend::success(state.settings.get(&key)?))
}

/// Route: PUT /settings/:key
pub async fn put_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    AppJson(req): AppJson<PutSettingRequest>,
) -> Result<Json<JSend<SettingResponse>>, ApiError> {
    let value = req
        .value
        .ok_or_else(|| ApiError::bad_request("value field is required"))?;
    let record = state.settings.put(&key, &SettingValue::from(value))?;
    Ok(JSend::success(setting_to_response(&record)))
}

/// Route: GET /admin/settings
pub async fn admin_list_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<SettingResponse>>>, ApiError> {
    let records = state.settings.records()?;
    Ok(JSend::success(
        records.iter().map(setting_to_response).collect(),
    ))
}

/// Route: PUT /admin/settings
pub async fn admin_save_settings(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<serde_json::Map<String, Value>>,
) -> Result<Json<JSend<Vec<SettingResponse>>>, ApiError> {
    put_all(&state, body)?;
    let records = state.settings.records()?;
    Ok(JSend::success(
        records.iter().map(setting_to_response).collect(),
    ))
}

// ============================================================================
// Helpers
// ============================================================================

/// Upsert every key of a JSON object. Keys are applied independently; if any
/// fail, the request fails and names them, while the successful keys stay saved.
/// Input problems answer 400, storage failures 500.
fn put_all(
    state: &AppState,
    body: serde_json::Map<String, Value>,
) -> Result<PutManyReport, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("at least one setting must be provided"));
    }

    let report = state
        .settings
        .put_many(body.into_iter().map(|(k, v)| (k, SettingValue::from(v))));

    if !report.is_complete() {
        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|f| format!("'{}': {}", f.key, f.error))
            .collect();
        let message = format!(
            "Failed to save settings ({} saved): {}",
            report.updated.len(),
            failed.join("; ")
        );
        return Err(if report.only_rejections() {
            ApiError::bad_request(message)
        } else {
            ApiError::internal(message)
        });
    }

    Ok(report)
}

fn setting_to_response(setting: &SettingRecord) -> SettingResponse {
    SettingResponse {
        created_at: setting.created_at.to_rfc3339(),
        description: setting.description.clone(),
        key: setting.key.clone(),
        kind: setting.kind,
        updated_at: setting.updated_at.to_rfc3339(),
        value: setting.value.clone(),
    }
}
