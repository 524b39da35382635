//! Song matching: artist resolution, keyword containment and artist selection.
//!
//! Every function here is pure and total. Malformed records degrade to empty
//! artist lists and empty titles, so callers never need error handling around
//! search.

use rustc_hash::FxHashSet;

use crate::models::{LegacyArtist, Song};
use crate::normalize::normalize;

// ============================================================================
// Artist Resolution
// ============================================================================

/// Resolve a song's artist list. First populated source wins:
/// 1. non-empty `artists` list
/// 2. non-empty legacy `artist` list
/// 3. non-blank legacy `artist` string (trimmed)
/// 4. nothing
pub fn artists_of(song: &Song) -> Vec<&str> {
    if !song.artists.is_empty() {
        return song.artists.iter().map(String::as_str).collect();
    }

    match &song.artist {
        Some(LegacyArtist::Many(list)) if !list.is_empty() => {
            list.iter().map(String::as_str).collect()
        }
        Some(LegacyArtist::One(name)) if !name.trim().is_empty() => vec![name.trim()],
        _ => Vec::new(),
    }
}

// ============================================================================
// Keyword Matching
// ============================================================================

/// Normalized searchable text: artists first, then the title, space-joined.
pub fn haystack(song: &Song) -> String {
    let mut parts: Vec<String> = artists_of(song).into_iter().map(normalize).collect();
    parts.push(normalize(&song.title));
    parts.join(" ")
}

/// Whether the song matches a free-text query.
///
/// Substring containment on normalized keys, not word matching: "umb" finds
/// "Humble". An empty or punctuation-only query matches everything.
pub fn matches(song: &Song, query: &str) -> bool {
    matches_key(song, &normalize(query))
}

/// [`matches`] with the query already normalized.
fn matches_key(song: &Song, query_key: &str) -> bool {
    query_key.is_empty() || haystack(song).contains(query_key)
}

/// Stable filter: matching songs in input order.
pub fn filter<'a>(songs: &'a [Song], query: &str) -> Vec<&'a Song> {
    let key = normalize(query);
    songs.iter().filter(|s| matches_key(s, &key)).collect()
}

// ============================================================================
// Artist Selection
// ============================================================================

/// Whether the song credits exactly `artist`. An empty selection matches all.
///
/// Exact and case-sensitive: selections come from [`unique_artists`] over
/// the same data.
pub fn matches_artist(song: &Song, artist: &str) -> bool {
    artist.is_empty() || artists_of(song).contains(&artist)
}

/// Every distinct artist name, ordered by search key then raw text.
pub fn unique_artists(songs: &[Song]) -> Vec<&str> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut keyed: Vec<(String, &str)> = songs
        .iter()
        .flat_map(artists_of)
        .filter(|a| seen.insert(*a))
        .map(|a| (normalize(a), a))
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, a)| a).collect()
}

// ============================================================================
// Combined Search
// ============================================================================

/// Keyword plus artist-dropdown filter, as driven by the playlist page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Search {
    pub query: String,
    pub artist: String, // "" = all artists
}

impl Search {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            artist: String::new(),
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Whether a single song passes both criteria.
    pub fn accepts(&self, song: &Song) -> bool {
        matches(song, &self.query) && matches_artist(song, &self.artist)
    }

    /// Stable filter applying both criteria.
    pub fn apply<'a>(&self, songs: &'a [Song]) -> Vec<&'a Song> {
        let key = normalize(&self.query);
        songs
            .iter()
            .filter(|s| matches_key(s, &key) && matches_artist(s, &self.artist))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Song> {
        vec![
            Song::new("God's Plan", ["Drake"]),
            Song::new("Humble", ["Kendrick Lamar"]),
        ]
    }

    fn legacy_one(name: &str) -> Song {
        Song {
            artist: Some(LegacyArtist::One(name.to_string())),
            ..Song::default()
        }
    }

    #[test]
    fn test_artists_of_shapes() {
        assert_eq!(artists_of(&legacy_one("Drake")), vec!["Drake"]);
        assert_eq!(artists_of(&legacy_one("  Drake  ")), vec!["Drake"]);
        assert_eq!(artists_of(&Song::new("", ["A", "B"])), vec!["A", "B"]);
        assert!(artists_of(&Song::default()).is_empty());
        assert!(artists_of(&legacy_one("   ")).is_empty());

        let many = Song {
            artist: Some(LegacyArtist::Many(vec!["X".into(), "Y".into()])),
            ..Song::default()
        };
        assert_eq!(artists_of(&many), vec!["X", "Y"]);
    }

    #[test]
    fn test_artists_of_first_source_wins() {
        // Plural field wins; the legacy value is never appended
        let song = Song {
            artists: vec!["Drake".into(), "Future".into()],
            artist: Some(LegacyArtist::One("Drake".into())),
            ..Song::default()
        };
        assert_eq!(artists_of(&song), vec!["Drake", "Future"]);

        // Empty legacy list falls through to nothing, not to a fault
        let empty = Song {
            artist: Some(LegacyArtist::Many(Vec::new())),
            ..Song::default()
        };
        assert!(artists_of(&empty).is_empty());
    }

    #[test]
    fn test_haystack_order() {
        let song = Song::new("HUMBLE.", ["Kendrick Lamar", "Mike WiLL Made-It"]);
        assert_eq!(haystack(&song), "kendrick lamar mike will made it humble");
    }

    #[test]
    fn test_empty_query_matches_everything() {
        for song in sample().iter().chain([Song::default()].iter()) {
            assert!(matches(song, ""));
            assert!(matches(song, "   "));
            assert!(matches(song, "?!"));
        }
    }

    #[test]
    fn test_substring_not_word_boundary() {
        let song = Song::new("Humble", ["Kendrick Lamar"]);
        assert!(matches(&song, "umb"));
        assert!(matches(&song, "lamar humble"));
        assert!(!matches(&song, "humble kendrick"));
    }

    #[test]
    fn test_quote_and_punctuation_insensitive() {
        let song = Song::new("God\u{2019}s Plan", ["Drake"]);
        assert!(matches(&song, "god's"));
        assert!(matches(&song, "GOD'S PLAN!"));
        assert!(matches(&Song::new("HUMBLE.", ["Kendrick Lamar"]), "humble"));
    }

    #[test]
    fn test_filter_end_to_end() {
        let songs = sample();

        let drake = filter(&songs, "drake");
        assert_eq!(drake.len(), 1);
        assert_eq!(drake[0].title, "God's Plan");

        let both = filter(&songs, "a");
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].title, "God's Plan");
        assert_eq!(both[1].title, "Humble");

        assert!(filter(&songs, "zzz").is_empty());
    }

    #[test]
    fn test_filter_is_stable_subsequence() {
        let songs = vec![
            Song::new("Alpha", ["One"]),
            Song::new("Beta", ["Two"]),
            Song::new("Alphabet", ["Three"]),
            Song::new("Gamma", ["One"]),
        ];
        let result = filter(&songs, "one");
        let titles: Vec<&str> = result.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Gamma"]);
        assert!(result.iter().all(|s| matches(s, "one")));
        assert_eq!(songs.len(), 4);
    }

    #[test]
    fn test_matches_artist_exact() {
        let song = Song::new("Money Trees", ["Kendrick Lamar", "Jay Rock"]);
        assert!(matches_artist(&song, ""));
        assert!(matches_artist(&song, "Jay Rock"));
        assert!(!matches_artist(&song, "jay rock"));
        assert!(!matches_artist(&song, "Jay"));
    }

    #[test]
    fn test_unique_artists_sorted_and_deduped() {
        let songs = vec![
            Song::new("A", ["drake", "Future"]),
            Song::new("B", ["Drake"]),
            legacy_one("Future"),
            Song::new("C", ["周杰倫"]),
            Song::new("D", ["Adele"]),
        ];
        assert_eq!(
            unique_artists(&songs),
            vec!["Adele", "Drake", "drake", "Future", "周杰倫"]
        );
        assert!(unique_artists(&[]).is_empty());
    }

    #[test]
    fn test_search_combined() {
        let songs = vec![
            Song::new("Money Trees", ["Kendrick Lamar", "Jay Rock"]),
            Song::new("Humble", ["Kendrick Lamar"]),
            Song::new("Hotline Bling", ["Drake"]),
        ];

        let all = Search::default().apply(&songs);
        assert_eq!(all.len(), 3);

        let by_artist = Search::default().with_artist("Kendrick Lamar").apply(&songs);
        assert_eq!(by_artist.len(), 2);

        let both = Search::new("trees").with_artist("Kendrick Lamar").apply(&songs);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].title, "Money Trees");

        assert!(Search::new("bling").with_artist("Jay Rock").apply(&songs).is_empty());

        let search = Search::new("lamar").with_artist("Jay Rock");
        let accepted: Vec<&str> = songs
            .iter()
            .filter(|s| search.accepts(s))
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(accepted, vec!["Money Trees"]);
    }
}
