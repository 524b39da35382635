//! Playlist search library - song matching core plus the loading and view
//! collaborators used by the `playlist-search` binary.

pub mod catalog;
pub mod debounce;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod render;
pub mod safety;

pub use matcher::{artists_of, filter, matches, matches_artist, unique_artists, Search};
pub use models::Song;
pub use normalize::normalize;
