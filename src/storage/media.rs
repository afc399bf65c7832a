use std::collections::BTreeSet;

use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{MediaFilter, MediaRecord, MediaUpdate};
use super::tables::*;

impl Database {
    // ========================================================================
    // Media operations
    // ========================================================================

    /// Store a media record and index its public path
    pub fn put_media(&self, media: &MediaRecord) -> Result<(), DatabaseError> {
        debug_assert!(!media.id.is_empty(), "media id must not be empty");
        debug_assert!(!media.path.is_empty(), "media path must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(MEDIA)?;
            let data = rmp_serde::to_vec_named(media)?;
            table.insert(media.id.as_str(), data.as_slice())?;

            let mut path_table = write_txn.open_table(MEDIA_PATHS)?;
            path_table.insert(media.path.as_str(), media.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a media record by its UUID
    pub fn get_media(&self, id: &str) -> Result<Option<MediaRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(MEDIA)?;

        match table.get(id)? {
            Some(data) => {
                let media: MediaRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(media))
            }
            None => Ok(None),
        }
    }

    /// Check if a public path is already indexed
    pub fn media_path_exists(&self, path: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(MEDIA_PATHS)?;
        Ok(table.get(path)?.is_some())
    }

    /// Apply a partial update to a media record's editable fields.
    /// Returns the updated record, or `None` when the id is unknown.
    pub fn update_media(
        &self,
        id: &str,
        update: &MediaUpdate,
    ) -> Result<Option<MediaRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(MEDIA)?;
            let result = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice::<MediaRecord>(data.value())?),
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut media) => {
                update.apply_to(&mut media, chrono::Utc::now());
                let serialized = rmp_serde::to_vec_named(&media)?;
                let mut table = write_txn.open_table(MEDIA)?;
                table.insert(id, serialized.as_slice())?;
                Some(media)
            }
            None => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Get all media records
    pub fn get_all_media(&self) -> Result<Vec<MediaRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(MEDIA)?;

        let mut media = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let record: MediaRecord = rmp_serde::from_slice(value.value())?;
            media.push(record);
        }

        Ok(media)
    }

    /// List media records matching a filter, unordered
    pub fn list_media(&self, filter: &MediaFilter) -> Result<Vec<MediaRecord>, DatabaseError> {
        Ok(self
            .get_all_media()?
            .into_iter()
            .filter(|m| filter.matches(m))
            .collect())
    }

    /// Distinct non-empty folders, newest `/<year>/<month>` first
    pub fn media_folders(&self) -> Result<Vec<String>, DatabaseError> {
        let folders: BTreeSet<String> = self
            .get_all_media()?
            .into_iter()
            .map(|m| m.folder)
            .filter(|f| !f.is_empty())
            .collect();
        Ok(folders.into_iter().rev().collect())
    }

    /// Distinct non-empty categories in ascending order
    pub fn media_categories(&self) -> Result<Vec<String>, DatabaseError> {
        let categories: BTreeSet<String> = self
            .get_all_media()?
            .into_iter()
            .filter_map(|m| m.category)
            .filter(|c| !c.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }
}
