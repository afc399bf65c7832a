use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;
    // Record paths are built from this prefix, so serve from the same place
    let uploads_route = format!("{}/*path", state.config.storage.uploads_url_prefix);

    let mut router = Router::new()
        // Media library (admin)
        .route("/admin/media", get(handlers::list_media))
        .route(
            "/admin/media",
            post(handlers::upload_many_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/admin/media/upload",
            post(handlers::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/admin/media/analyze",
            get(handlers::analyze_media).post(handlers::apply_media_analysis),
        )
        .route("/admin/media/batch-update", post(handlers::batch_update_media))
        .route("/admin/media/check", get(handlers::check_media))
        .route("/admin/media/folders", get(handlers::list_folders))
        .route(
            "/admin/media/scan",
            get(handlers::scan_preview).post(handlers::scan_import),
        )
        .route(
            "/admin/media/:id",
            get(handlers::get_media).put(handlers::update_media),
        )
        // Settings
        .route(
            "/admin/settings",
            get(handlers::admin_list_settings).put(handlers::admin_save_settings),
        )
        .route(
            "/settings",
            get(handlers::get_settings).post(handlers::save_settings),
        )
        .route(
            "/settings/:key",
            get(handlers::get_setting).put(handlers::put_setting),
        )
        // Public content
        .route("/gallery", get(handlers::gallery))
        .route("/media/:id", get(handlers::serve_media))
        .route(&uploads_route, get(handlers::serve_upload))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled, DELETE /admin/purge is available");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
