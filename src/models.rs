//! Core data models for the playlist.
//!
//! Song records arrive as loosely-shaped JSON (three legacy artist shapes,
//! occasional non-string values), so they are read from `serde_json::Value`
//! structurally instead of through a strict derive.

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Song Models
// ============================================================================

/// Legacy singular `artist` field: either a list or a single name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegacyArtist {
    Many(Vec<String>),
    One(String),
}

/// One song's metadata as consumed by the matcher.
///
/// Fields keep the source shape; use [`crate::matcher::artists_of`] to get the
/// resolved artist list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    pub artists: Vec<String>,          // Current format: "artists": ["A", "B"]
    pub artist: Option<LegacyArtist>,  // Old format: "artist": "A" or ["A"]
    pub reel: Option<String>,          // Instagram Reel permalink
    pub page: Option<String>,          // Translation page link
}

impl Song {
    /// Song in the current `artists: [...]` format.
    pub fn new<T, I, A>(title: T, artists: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            title: title.into(),
            artists: artists.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_reel(mut self, reel: impl Into<String>) -> Self {
        self.reel = Some(reel.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Build a record from one element of the song collection.
    /// Anything that is not an object yields an empty record.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        // Only a real string counts as the single-name shape
        let artist = match obj.get("artist") {
            Some(Value::Array(items)) => Some(LegacyArtist::Many(text_list(items))),
            Some(Value::String(name)) => Some(LegacyArtist::One(name.clone())),
            _ => None,
        };

        Self {
            title: obj.get("title").and_then(value_text).unwrap_or_default(),
            artists: match obj.get("artists") {
                Some(Value::Array(items)) => text_list(items),
                _ => Vec::new(),
            },
            artist,
            reel: obj.get("reel").and_then(value_text),
            page: obj.get("page").and_then(value_text),
        }
    }

    /// Reel link, if present and not blank.
    pub fn reel_link(&self) -> Option<&str> {
        non_blank(self.reel.as_deref())
    }

    /// Translation page link, if present and not blank.
    pub fn page_link(&self) -> Option<&str> {
        non_blank(self.page.as_deref())
    }
}

/// Flattened view of a song for JSON output, with artists resolved.
#[derive(Debug, Serialize)]
pub struct SongOutput<'a> {
    pub title: &'a str,
    pub artists: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<&'a str>,
}

impl<'a> From<&'a Song> for SongOutput<'a> {
    fn from(song: &'a Song) -> Self {
        Self {
            title: &song.title,
            artists: crate::matcher::artists_of(song),
            reel: song.reel_link(),
            page: song.page_link(),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Per-run counts for one search pass.
#[derive(Default, Debug, Clone, Serialize)]
pub struct SearchStats {
    pub total_songs: usize,
    pub matched: usize,
    pub displayed: usize,
    pub hidden_by_cap: usize,
    pub distinct_artists: usize,
    pub songs_without_reel: usize,
    pub elapsed_ms: f64,
}

impl SearchStats {
    /// Match rate as a percentage of the catalog
    pub fn match_rate(&self) -> f64 {
        if self.total_songs == 0 {
            0.0
        } else {
            100.0 * self.matched as f64 / self.total_songs as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log(&self) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS]\n{}", json);
        }
    }
}

// ============================================================================
// Value coercion
// ============================================================================

/// Text form of a field value. Null and objects have none; arrays are
/// comma-joined the way a browser stringifies them (`["a","b"]` → "a,b").
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        other => Some(member_text(other)),
    }
}

/// Text form of a list member. Null and objects become the empty string.
fn member_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items.iter().map(member_text).collect::<Vec<_>>().join(","),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// Every member kept, in order, so a non-empty list stays non-empty.
fn text_list(items: &[Value]) -> Vec<String> {
    items.iter().map(member_text).collect()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
