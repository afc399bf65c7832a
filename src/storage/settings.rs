use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{SettingKind, SettingRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // Setting operations
    // ========================================================================

    /// Get a setting by key
    pub fn get_setting(&self, key: &str) -> Result<Option<SettingRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SETTINGS)?;

        match table.get(key)? {
            Some(data) => {
                let setting: SettingRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(setting))
            }
            None => Ok(None),
        }
    }

    /// Insert or replace the encoded value of a setting in one transaction.
    /// `created_at` and `description` of an existing record are kept.
    pub fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        kind: SettingKind,
    ) -> Result<SettingRecord, DatabaseError> {
        debug_assert!(!key.is_empty(), "setting key must not be empty");

        let write_txn = self.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(SETTINGS)?;
            let existing = match table.get(key)? {
                Some(data) => Some(rmp_serde::from_slice::<SettingRecord>(data.value())?),
                None => None,
            };

            let now = Utc::now();
            let record = match existing {
                Some(previous) => SettingRecord {
                    value: value.to_string(),
                    kind,
                    updated_at: now,
                    ..previous
                },
                None => SettingRecord {
                    key: key.to_string(),
                    value: value.to_string(),
                    kind,
                    description: None,
                    created_at: now,
                    updated_at: now,
                },
            };

            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(key, data.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Store a setting record exactly as given, bypassing encoding
    pub fn put_setting_record(&self, setting: &SettingRecord) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS)?;
            let data = rmp_serde::to_vec_named(setting)?;
            table.insert(setting.key.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get all settings ordered by key
    pub fn get_all_settings(&self) -> Result<Vec<SettingRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SETTINGS)?;

        let mut settings = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let setting: SettingRecord = rmp_serde::from_slice(value.value())?;
            settings.push(setting);
        }

        Ok(settings)
    }
}
