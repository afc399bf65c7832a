//! Typed settings store: values are persisted as strings tagged with the
//! kind needed to decode them back to their original type.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::assets::AssetStore;
use crate::error::StoreError;
use crate::storage::models::{SettingKind, SettingRecord};
use crate::storage::Database;

/// Field of a structured setting that references a media record.
const MEDIA_REFERENCE_FIELD: &str = "mediaId";
/// Field added to a structured setting with the referenced media's public path.
const MEDIA_PATH_FIELD: &str = "imagePath";

/// A decoded setting value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Number(Number),
    String(String),
    /// Objects, arrays and null
    Json(Value),
}

impl From<Value> for SettingValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => SettingValue::Boolean(b),
            Value::Number(n) => SettingValue::Number(n),
            Value::String(s) => SettingValue::String(s),
            other => SettingValue::Json(other),
        }
    }
}

impl From<SettingValue> for Value {
    fn from(value: SettingValue) -> Self {
        match value {
            SettingValue::Boolean(b) => Value::Bool(b),
            SettingValue::Number(n) => Value::Number(n),
            SettingValue::String(s) => Value::String(s),
            SettingValue::Json(v) => v,
        }
    }
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Boolean(_) => SettingKind::Boolean,
            SettingValue::Number(_) => SettingKind::Number,
            SettingValue::String(_) => SettingKind::String,
            SettingValue::Json(_) => SettingKind::Json,
        }
    }

    /// Encode to the stored string form.
    pub fn encode(&self) -> String {
        match self {
            SettingValue::Boolean(true) => "true".to_string(),
            SettingValue::Boolean(false) => "false".to_string(),
            SettingValue::Number(n) => n.to_string(),
            SettingValue::String(s) => s.clone(),
            SettingValue::Json(v) => v.to_string(),
        }
    }

    /// Decode a stored string according to its kind. Undecodable numbers and
    /// JSON degrade to the raw string instead of failing.
    pub fn decode(kind: SettingKind, raw: &str) -> Self {
        match kind {
            SettingKind::Boolean => SettingValue::Boolean(raw == "true"),
            SettingKind::Number => match serde_json::from_str::<Number>(raw) {
                Ok(n) => SettingValue::Number(n),
                Err(_) => SettingValue::String(raw.to_string()),
            },
            SettingKind::Json => match serde_json::from_str::<Value>(raw) {
                Ok(v) => SettingValue::Json(v),
                Err(_) => SettingValue::String(raw.to_string()),
            },
            SettingKind::String => SettingValue::String(raw.to_string()),
        }
    }

    fn from_record(record: &SettingRecord) -> Self {
        Self::decode(record.kind, &record.value)
    }
}

/// A key that could not be saved, with the error that stopped it.
#[derive(Debug)]
pub struct KeyFailure {
    pub key: String,
    pub error: StoreError,
}

/// Outcome of a multi-key put.
#[derive(Debug, Default)]
pub struct PutManyReport {
    pub updated: Vec<String>,
    pub failed: Vec<KeyFailure>,
}

impl PutManyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when every failed key was refused for its input, not by storage.
    pub fn only_rejections(&self) -> bool {
        self.failed.iter().all(|f| f.error.is_rejection())
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    db: Database,
    assets: AssetStore,
}

impl SettingsStore {
    pub fn new(db: Database, assets: AssetStore) -> Self {
        Self { db, assets }
    }

    /// Upsert one setting, replacing any previous value for the key.
    pub fn put(&self, key: &str, value: &SettingValue) -> Result<SettingRecord, StoreError> {
        if key.trim().is_empty() {
            return Err(StoreError::rejected("setting key must not be empty"));
        }
        let record = self.db.upsert_setting(key, &value.encode(), value.kind())?;
        tracing::debug!(key = %key, kind = ?record.kind, "Saved setting");
        Ok(record)
    }

    /// Upsert each key independently. Keys that fail are reported; the others stay applied.
    pub fn put_many<I>(&self, values: I) -> PutManyReport
    where
        I: IntoIterator<Item = (String, SettingValue)>,
    {
        let mut report = PutManyReport::default();
        for (key, value) in values {
            match self.put(&key, &value) {
                Ok(_) => report.updated.push(key),
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Failed to save setting");
                    report.failed.push(KeyFailure { key, error: e });
                }
            }
        }
        report
    }

    /// Decode one setting. Structured values referencing a media record gain
    /// that record's public path.
    pub fn get(&self, key: &str) -> Result<SettingValue, StoreError> {
        let record = self
            .db
            .get_setting(key)?
            .ok_or_else(|| StoreError::not_found("Setting not found"))?;

        match SettingValue::from_record(&record) {
            SettingValue::Json(Value::Object(mut object)) => {
                let media_id = object
                    .get(MEDIA_REFERENCE_FIELD)
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if let Some(media_id) = media_id {
                    match self.assets.find(&media_id)? {
                        Some(media) => {
                            object.insert(MEDIA_PATH_FIELD.to_string(), Value::String(media.path));
                        }
                        None => {
                            tracing::debug!(key = %key, media_id = %media_id, "Referenced media not found");
                        }
                    }
                }
                Ok(SettingValue::Json(Value::Object(object)))
            }
            other => Ok(other),
        }
    }

    /// Decode every setting into a key-ordered map.
    pub fn get_all(&self) -> Result<BTreeMap<String, SettingValue>, StoreError> {
        Ok(self
            .db
            .get_all_settings()?
            .iter()
            .map(|record| (record.key.clone(), SettingValue::from_record(record)))
            .collect())
    }

    /// Raw stored records, for the admin panel.
    pub fn records(&self) -> Result<Vec<SettingRecord>, StoreError> {
        Ok(self.db.get_all_settings()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::LocalStore;
    use bytes::Bytes;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Database,
        assets: AssetStore,
        settings: SettingsStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("data")).unwrap();
        let objects = LocalStore::new(dir.path().join("uploads")).unwrap();
        let assets = AssetStore::new(db.clone(), Arc::new(objects), "/uploads");
        let settings = SettingsStore::new(db.clone(), assets.clone());
        Fixture {
            _dir: dir,
            db,
            assets,
            settings,
        }
    }

    #[test]
    fn test_round_trip_for_every_kind() {
        let f = fixture();
        let values = [
            json!(true),
            json!(false),
            json!(0),
            json!(42),
            json!(-3.5),
            json!("hello"),
            json!({"a": 1, "b": [1, 2]}),
            json!([1, "two"]),
        ];

        for (i, value) in values.into_iter().enumerate() {
            let key = format!("key-{i}");
            let typed = SettingValue::from(value.clone());
            f.settings.put(&key, &typed).unwrap();
            let decoded = f.settings.get(&key).unwrap();
            assert_eq!(decoded, typed, "round trip of {value}");
            assert_eq!(Value::from(decoded), value);
        }
    }

    #[test]
    fn test_boolean_encoding() {
        let f = fixture();
        f.settings
            .put("siteTitle", &SettingValue::Boolean(true))
            .unwrap();

        let stored = f.db.get_setting("siteTitle").unwrap().unwrap();
        assert_eq!(stored.kind, SettingKind::Boolean);
        assert_eq!(stored.value, "true");
        assert_eq!(
            f.settings.get("siteTitle").unwrap(),
            SettingValue::Boolean(true)
        );
    }

    #[test]
    fn test_encoding_tags() {
        assert_eq!(SettingValue::from(json!(42)).encode(), "42");
        assert_eq!(SettingValue::from(json!(1.5)).encode(), "1.5");
        assert_eq!(SettingValue::from(json!("plain")).encode(), "plain");
        assert_eq!(
            SettingValue::from(json!({"a": 1})).encode(),
            r#"{"a":1}"#
        );
        assert_eq!(SettingValue::from(json!(null)).kind(), SettingKind::Json);
    }

    #[test]
    fn test_last_write_wins_and_kind_follows_value() {
        let f = fixture();
        f.settings
            .put("banner", &SettingValue::String("old".into()))
            .unwrap();
        let first = f.db.get_setting("banner").unwrap().unwrap();
        f.settings
            .put("banner", &SettingValue::from(json!({"text": "new"})))
            .unwrap();

        let stored = f.db.get_setting("banner").unwrap().unwrap();
        assert_eq!(stored.kind, SettingKind::Json);
        assert_eq!(stored.created_at, first.created_at);
        assert_eq!(
            f.settings.get("banner").unwrap(),
            SettingValue::Json(json!({"text": "new"}))
        );
    }

    #[test]
    fn test_corrupted_json_degrades_to_raw_string() {
        let f = fixture();
        let now = Utc::now();
        f.db.put_setting_record(&SettingRecord {
            key: "broken".to_string(),
            value: "{not json".to_string(),
            kind: SettingKind::Json,
            description: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        assert_eq!(
            f.settings.get("broken").unwrap(),
            SettingValue::String("{not json".to_string())
        );
        assert_eq!(
            f.settings.get_all().unwrap()["broken"],
            SettingValue::String("{not json".to_string())
        );
    }

    #[test]
    fn test_get_missing_key() {
        let f = fixture();
        assert!(matches!(
            f.settings.get("nope"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_put_rejects_empty_key() {
        let f = fixture();
        assert!(matches!(
            f.settings.put(" ", &SettingValue::Boolean(false)),
            Err(StoreError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_media_reference_is_enriched() {
        let f = fixture();
        let media = f
            .assets
            .ingest(Bytes::from_static(b"png"), "img.png", "image/png")
            .await
            .unwrap();

        f.settings
            .put("hero", &SettingValue::from(json!({"mediaId": media.id})))
            .unwrap();

        assert_eq!(
            Value::from(f.settings.get("hero").unwrap()),
            json!({"mediaId": media.id, "imagePath": media.path})
        );

        // Enrichment is not persisted and not applied to the bulk read
        let all = f.settings.get_all().unwrap();
        assert_eq!(
            Value::from(all["hero"].clone()),
            json!({"mediaId": media.id})
        );
    }

    #[test]
    fn test_unknown_media_reference_is_left_alone() {
        let f = fixture();
        f.settings
            .put("hero", &SettingValue::from(json!({"mediaId": "X"})))
            .unwrap();
        assert_eq!(
            Value::from(f.settings.get("hero").unwrap()),
            json!({"mediaId": "X"})
        );
    }

    #[test]
    fn test_put_many_and_get_all() {
        let f = fixture();
        let report = f.settings.put_many(vec![
            ("contactEmail".to_string(), SettingValue::from(json!("hello@example.org"))),
            ("showNewsletter".to_string(), SettingValue::from(json!(false))),
            ("seasonYear".to_string(), SettingValue::from(json!(2025))),
            ("".to_string(), SettingValue::from(json!("ignored"))),
        ]);

        assert_eq!(report.updated.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "");
        assert!(!report.is_complete());
        assert!(report.only_rejections());

        let all = f.settings.get_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["showNewsletter"], SettingValue::Boolean(false));
        assert_eq!(all["seasonYear"], SettingValue::from(json!(2025)));
    }
}
