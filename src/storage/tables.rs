use redb::TableDefinition;

/// Media records: uuid -> MediaRecord (msgpack)
pub const MEDIA: TableDefinition<&str, &[u8]> = TableDefinition::new("media");

/// Public path index: `/uploads/...` path -> uuid (for scan de-duplication)
pub const MEDIA_PATHS: TableDefinition<&str, &str> = TableDefinition::new("media_paths");

/// Settings: key -> SettingRecord (msgpack)
pub const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");
