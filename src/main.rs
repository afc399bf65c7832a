use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use troupe_cms::{
    api, assets::AssetStore, config::Config, object_store::LocalStore, settings::SettingsStore,
    storage::Database, AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "troupe-cms starting");

    let config = Config::load()?;

    let db = Database::open(&config.node.data_dir)?;
    info!("Database opened at: {}", config.node.data_dir);

    let objects = LocalStore::new(&config.storage.uploads_dir)?;
    info!(
        uploads_dir = %config.storage.uploads_dir,
        url_prefix = %config.storage.uploads_url_prefix,
        cdn = config.storage.cdn_url.as_deref().unwrap_or("none"),
        "Upload root ready"
    );

    let assets = AssetStore::new(
        db.clone(),
        Arc::new(objects),
        config.storage.uploads_url_prefix.clone(),
    );
    let settings = SettingsStore::new(db.clone(), assets.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        assets,
        settings,
    });

    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Install the global subscriber. `LOG_FORMAT=gcp` emits Stackdriver records,
/// `json` plain JSON lines, anything else human-readable output.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    match std::env::var("LOG_FORMAT")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "gcp" => registry.with(tracing_stackdriver::layer()).init(),
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_list(false),
            )
            .init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
