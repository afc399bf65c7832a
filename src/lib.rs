//! troupe-cms - Media library and typed site settings for a theater company website
//!
//! This crate provides:
//! - Media ingest into a dated upload tree with metadata records
//! - Serving uploads by record id or by path, confined to the upload root
//! - Typed key/value settings persisted as tagged strings
//! - redb embedded database for records (ACID, MVCC, crash-safe)
//! - REST API with multipart upload support

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod object_store;
pub mod settings;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use assets::AssetStore;
use config::Config;
use settings::SettingsStore;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub assets: AssetStore,
    pub settings: SettingsStore,
}
