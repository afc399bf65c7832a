//! Shared test helpers for troupe-cms tests.

use std::sync::Arc;

use crate::assets::AssetStore;
use crate::config::{Config, NodeConfig, StorageConfig};
use crate::object_store::LocalStore;
use crate::settings::SettingsStore;
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState with a temporary database and upload root.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    test_state_with(temp_dir, |_| {})
}

/// Same as [`test_state`], with the config adjusted before the stores are built.
pub fn test_state_with(
    temp_dir: &tempfile::TempDir,
    configure: impl FnOnce(&mut Config),
) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let uploads_dir = temp_dir.path().join("uploads");

    let mut config = Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            uploads_dir: uploads_dir.to_string_lossy().to_string(),
            uploads_url_prefix: "/uploads".to_string(),
            cdn_url: None,
        },
        test_mode: true,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    };
    configure(&mut config);

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let objects = LocalStore::new(&uploads_dir).expect("Failed to create test upload root");
    let assets = AssetStore::new(
        db.clone(),
        Arc::new(objects),
        config.storage.uploads_url_prefix.clone(),
    );
    let settings = SettingsStore::new(db.clone(), assets.clone());

    Arc::new(AppState {
        config,
        db,
        assets,
        settings,
    })
}
