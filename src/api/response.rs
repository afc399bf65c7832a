use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::StoreError;

// ============================================================================
// JSend envelopes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JSendStatus {
    Error,
    Fail,
    Success,
}

/// `{"status": "success", "data": ...}`
#[derive(Debug, Serialize)]
pub struct JSend<T: Serialize> {
    pub data: T,
    pub status: JSendStatus,
}

impl<T: Serialize> JSend<T> {
    pub fn success(data: T) -> Json<JSend<T>> {
        Json(JSend {
            data,
            status: JSendStatus::Success,
        })
    }
}

/// One page of a listing, wrapped as `data` of a success envelope.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub limit: u32,
    pub page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            limit,
            page,
            total,
            total_pages: total.div_ceil(u64::from(limit.max(1))),
        }
    }

    /// Number of items to skip for this page (pages are 1-based).
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

// ============================================================================
// Handler errors
// ============================================================================

/// Handler error rendered as a JSend `fail` (4xx) or `error` (5xx) body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.status.is_server_error() {
            json!({ "message": self.message, "status": JSendStatus::Error })
        } else {
            json!({ "data": { "message": self.message }, "status": JSendStatus::Fail })
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(message) => ApiError::not_found(message),
            StoreError::Rejected(message) => ApiError::bad_request(message),
            other => {
                tracing::error!(error = %other, "Storage failure");
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => {
                format!("Invalid request body: {}", err.body_text())
            }
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".to_string(),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing Content-Type: application/json header".to_string()
            }
            _ => "Failed to read request body".to_string(),
        };
        ApiError::bad_request(message)
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// `axum::Json` with JSend-formatted rejections.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string extractor backed by `serde_qs`, with JSend-formatted rejections.
pub struct AppQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, ApiError> {
        let query = parts.uri.query().unwrap_or_default();
        serde_qs::from_str(query)
            .map(AppQuery)
            .map_err(|e| ApiError::bad_request(query_error_message(&e)))
    }
}

/// Describe integer parameters in words rather than Rust type names.
fn query_error_message(err: &serde_qs::Error) -> String {
    let raw = err.to_string();
    let described = ["u32", "u64"]
        .iter()
        .fold(raw, |msg, ty| msg.replace(ty, "a positive whole number"));
    format!("Invalid query parameter: {described}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_errors_render_as_fail() {
        let response = ApiError::not_found("Media not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"data": {"message": "Media not found"}, "status": "fail"})
        );
    }

    #[tokio::test]
    async fn test_server_errors_render_as_error() {
        let response = ApiError::from(StoreError::Database(
            crate::storage::DatabaseError::Io(std::io::Error::other("disk gone")),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("disk gone"));
    }

    #[test]
    fn test_store_error_status_mapping() {
        assert_eq!(
            ApiError::from(StoreError::rejected("Invalid path")).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::not_found("Setting not found")).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_pagination() {
        let pagination = Pagination::new(3, 20, 45);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.offset(), 40);
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
    }
}
