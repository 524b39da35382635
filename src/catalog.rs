//! Song collection loading.
//!
//! The loaded list lives in a caller-owned [`Catalog`]; there is no module-wide
//! song list. All retrieval failures are reported here as [`CatalogError`] and
//! never reach the matcher, which only ever sees a (possibly empty) slice.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::CACHE_CONTROL;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::matcher::{unique_artists, Search};
use crate::models::Song;

/// Request timeout for remote song lists
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed: {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid song list JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Source
// ============================================================================

/// Where a song list comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogSource {
    Path(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// `http://` and `https://` arguments are URLs, everything else is a path.
    pub fn parse(arg: &str) -> Self {
        let lower = arg.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            CatalogSource::Url(arg.trim().to_string())
        } else {
            CatalogSource::Path(PathBuf::from(arg))
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            CatalogSource::Path(p) => Some(p),
            CatalogSource::Url(_) => None,
        }
    }

    /// Fetch or read the raw JSON text.
    pub fn read(&self) -> Result<String, CatalogError> {
        match self {
            CatalogSource::Path(path) => {
                std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })
            }
            CatalogSource::Url(url) => fetch(url),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Path(p) => write!(f, "{}", p.display()),
            CatalogSource::Url(u) => f.write_str(u),
        }
    }
}

/// GET a song list, bypassing caches.
fn fetch(url: &str) -> Result<String, CatalogError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    fetch_with(&client, url)
}

fn fetch_with(client: &reqwest::blocking::Client, url: &str) -> Result<String, CatalogError> {
    let response = client.get(url).header(CACHE_CONTROL, "no-store").send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.text()?)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a song list. A top-level value that is not an array is an empty list;
/// only malformed JSON is an error.
pub fn parse_songs(json: &str) -> Result<Vec<Song>, CatalogError> {
    let value: Value = serde_json::from_str(json)?;
    Ok(songs_from_value(&value))
}

pub fn songs_from_value(value: &Value) -> Vec<Song> {
    match value {
        Value::Array(items) => items.iter().map(Song::from_value).collect(),
        other => {
            warn!(kind = json_kind(other), "song list is not an array, treating as empty");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Caller-owned song collection with explicit load/replace.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    songs: Vec<Song>,
    source: Option<CatalogSource>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_songs(songs: Vec<Song>) -> Self {
        Self {
            songs,
            source: None,
        }
    }

    /// Load a catalog from a file or URL.
    pub fn load(source: CatalogSource) -> Result<Self, CatalogError> {
        let raw = source.read()?;
        let songs = parse_songs(&raw)?;
        info!(source = %source, songs = songs.len(), "loaded song list");
        Ok(Self {
            songs,
            source: Some(source),
        })
    }

    /// Re-read the catalog from where it was loaded. On failure the current
    /// songs are kept.
    pub fn reload(&mut self) -> Result<usize, CatalogError> {
        let Some(source) = self.source.clone() else {
            debug!("reload on in-memory catalog, nothing to do");
            return Ok(self.songs.len());
        };
        let fresh = Self::load(source)?;
        self.replace(fresh.songs);
        Ok(self.songs.len())
    }

    /// Swap in a new song list, returning the previous one.
    pub fn replace(&mut self, songs: Vec<Song>) -> Vec<Song> {
        debug!(old = self.songs.len(), new = songs.len(), "replacing song list");
        std::mem::replace(&mut self.songs, songs)
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn source(&self) -> Option<&CatalogSource> {
        self.source.as_ref()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn search(&self, search: &Search) -> Vec<&Song> {
        search.apply(&self.songs)
    }

    /// Options for the artist dropdown.
    pub fn artists(&self) -> Vec<&str> {
        unique_artists(&self.songs)
    }
}
