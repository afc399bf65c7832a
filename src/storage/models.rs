use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-state patch value for partial updates.
/// Unlike `Option<Option<T>>`, each variant reads as what it means at the call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    /// Field was not included in the request (no change).
    #[default]
    Absent,
    /// Field was explicitly set to null (clear it).
    Null,
    /// Field was set to a new value.
    Value(T),
}

impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(v: Option<Option<T>>) -> Self {
        match v {
            None => Patch::Absent,
            Some(None) => Patch::Null,
            Some(Some(v)) => Patch::Value(v),
        }
    }
}

impl<T: Clone> Patch<T> {
    /// Apply the patch to a nullable field.
    pub fn apply(&self, field: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *field = None,
            Patch::Value(v) => *field = Some(v.clone()),
        }
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

/// Broad classification of a media file derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Document,
    Image,
    Other,
    Video,
}

impl MediaKind {
    /// Derive a media kind from a MIME type string.
    pub fn from_mime(mime_type: &str) -> Self {
        let (primary, sub) = mime_type.split_once('/').unwrap_or((mime_type, ""));
        match primary {
            "audio" => MediaKind::Audio,
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            "text" => MediaKind::Document,
            "application" if sub == "pdf" => MediaKind::Document,
            _ => MediaKind::Other,
        }
    }
}

/// Back-reference from a media record to an entity field that uses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUsage {
    pub model: String,
    pub id: String,
    pub field: String,
}

/// A media record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    // Set at ingest, immutable afterwards
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub path: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Editable metadata
    pub original_name: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub used_in: Vec<MediaUsage>,
    #[serde(default)]
    pub show_in_gallery: bool,
}

impl MediaRecord {
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

/// Partial update of a media record's editable fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaUpdate {
    pub original_name: Option<String>,
    pub alt: Patch<String>,
    pub caption: Patch<String>,
    pub category: Patch<String>,
    pub tags: Option<Vec<String>>,
    pub folder: Option<String>,
    pub show_in_gallery: Option<bool>,
}

impl MediaUpdate {
    pub fn is_empty(&self) -> bool {
        self.original_name.is_none()
            && self.alt.is_absent()
            && self.caption.is_absent()
            && self.category.is_absent()
            && self.tags.is_none()
            && self.folder.is_none()
            && self.show_in_gallery.is_none()
    }

    fn apply(&self, record: &mut MediaRecord) {
        if let Some(ref name) = self.original_name {
            record.original_name = name.clone();
        }
        self.alt.apply(&mut record.alt);
        self.caption.apply(&mut record.caption);
        self.category.apply(&mut record.category);
        if let Some(ref tags) = self.tags {
            record.tags = tags.clone();
        }
        if let Some(ref folder) = self.folder {
            record.folder = folder.clone();
        }
        if let Some(show) = self.show_in_gallery {
            record.show_in_gallery = show;
        }
    }

    /// Apply to a record and bump its modification time.
    pub fn apply_to(&self, record: &mut MediaRecord, now: DateTime<Utc>) {
        self.apply(record);
        record.updated_at = now;
    }
}

/// Filters for listing media records. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    /// Case-insensitive substring over original name, alt, caption and tags
    pub search: Option<String>,
    pub folder: Option<String>,
    pub category: Option<String>,
    /// `image`, `video` and `audio` match the primary type; anything else is a substring match
    pub mime_type: Option<String>,
    /// Only records flagged for the public gallery with an image MIME type
    pub gallery_only: bool,
}

impl MediaFilter {
    pub fn matches(&self, record: &MediaRecord) -> bool {
        if self.gallery_only && !(record.show_in_gallery && record.kind() == MediaKind::Image) {
            return false;
        }
        if let Some(ref folder) = self.folder {
            if &record.folder != folder {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if record.category.as_ref() != Some(category) {
                return false;
            }
        }
        if let Some(ref mime) = self.mime_type {
            let matched = match mime.as_str() {
                "image" => record.kind() == MediaKind::Image,
                "video" => record.kind() == MediaKind::Video,
                "audio" => record.kind() == MediaKind::Audio,
                other => record.mime_type.contains(other),
            };
            if !matched {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            let hit = |s: &str| s.to_lowercase().contains(&needle);
            let found = hit(&record.original_name)
                || record.alt.as_deref().is_some_and(hit)
                || record.caption.as_deref().is_some_and(hit)
                || record.tags.iter().any(|t| hit(t));
            if !found {
                return false;
            }
        }
        true
    }
}

/// How a setting's stored string must be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Boolean,
    Json,
    Number,
    String,
}

/// A setting record stored in redb. `value` is always the encoded string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
    pub kind: SettingKind,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
