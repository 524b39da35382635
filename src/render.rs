//! Result cards, status messages and output sinks.
//!
//! The display cap and the "too many results" notice are view policies: the
//! matcher hands over every match and this module decides how many to show.

use std::io::{self, Stderr, Stdout, Write};

use tracing::warn;

use crate::matcher::artists_of;
use crate::models::{Song, SongOutput};

/// Maximum number of cards shown for one search
pub const DEFAULT_DISPLAY_CAP: usize = 30;

/// Separator between artist names on a card
pub const DEFAULT_SEPARATOR: &str = ", ";

/// Number of entries in the recently-added panel
pub const DEFAULT_RECENT_COUNT: usize = 6;

/// `data-instgrm-version` expected by Instagram's embed.js
pub const INSTAGRAM_EMBED_VERSION: u32 = 14;

pub const LOADING_MESSAGE: &str = "Loading…";
pub const NO_RESULTS_MESSAGE: &str = "No matching songs.";
pub const MISSING_REEL_NOTE: &str = "(missing reels link)";
pub const ALL_ARTISTS_LABEL: &str = "All artists";

// ============================================================================
// Configuration
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    pub display_cap: usize,
    pub separator: String,
    pub embed_reels: bool, // Emit Instagram blockquote embeds on HTML cards
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            display_cap: DEFAULT_DISPLAY_CAP,
            separator: DEFAULT_SEPARATOR.to_string(),
            embed_reels: true,
        }
    }
}

// ============================================================================
// Text helpers
// ============================================================================

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn artist_label(song: &Song, separator: &str) -> String {
    artists_of(song).join(separator)
}

/// "N songs" status line, or the no-results message.
pub fn status_message(count: usize) -> String {
    match count {
        0 => NO_RESULTS_MESSAGE.to_string(),
        1 => "1 song".to_string(),
        n => format!("{} songs", n),
    }
}

pub fn load_failed_message(err: &dyn std::fmt::Display) -> String {
    format!("Load failed: {}", err)
}

pub fn excess_notice(cap: usize) -> String {
    format!(
        "More than {} matching songs, please enter a more specific keyword.",
        cap
    )
}

/// The last `count` songs of the collection, newest first.
pub fn recent_songs(songs: &[Song], count: usize) -> Vec<&Song> {
    songs.iter().rev().take(count).collect()
}

// ============================================================================
// Cards
// ============================================================================

pub fn card_html(song: &Song, cfg: &ViewConfig) -> String {
    let title = escape_html(&song.title);
    let artists = escape_html(&artist_label(song, &cfg.separator));

    let mut links = String::new();
    if let Some(page) = song.page_link() {
        links.push_str(&format!(
            r#"<a class="btn" href="{}">Translation</a>"#,
            escape_html(page)
        ));
    }
    match song.reel_link() {
        Some(reel) => links.push_str(&format!(
            r#"<a class="btn" href="{}" target="_blank" rel="noopener">Reels</a>"#,
            escape_html(reel)
        )),
        None => links.push_str(&format!(
            r#"<span class="missing">{}</span>"#,
            MISSING_REEL_NOTE
        )),
    }

    let embed = match song.reel_link() {
        Some(reel) if cfg.embed_reels => {
            let reel = escape_html(reel);
            format!(
                r#"
  <blockquote class="instagram-media" data-instgrm-permalink="{reel}" data-instgrm-version="{version}">
    <a href="{reel}" target="_blank" rel="noopener">Open on Instagram</a>
  </blockquote>"#,
                reel = reel,
                version = INSTAGRAM_EMBED_VERSION
            )
        }
        _ => String::new(),
    };

    format!(
        r#"<div class="card">
  <h3>{}</h3>
  <div class="artists">{}</div>
  <div class="links">{}</div>{}
</div>"#,
        title, artists, links, embed
    )
}

pub fn card_text(song: &Song, cfg: &ViewConfig) -> String {
    let artists = artist_label(song, &cfg.separator);
    let mut out = if artists.is_empty() {
        song.title.clone()
    } else {
        format!("{} — {}", song.title, artists)
    };
    if let Some(page) = song.page_link() {
        out.push_str(&format!("\n    translation: {}", page));
    }
    match song.reel_link() {
        Some(reel) => out.push_str(&format!("\n    reels: {}", reel)),
        None => out.push_str(&format!("\n    {}", MISSING_REEL_NOTE)),
    }
    out
}

// ============================================================================
// Result lists
// ============================================================================

/// A capped slice of results plus whether the notice is needed.
#[derive(Debug)]
pub struct ResultPage<'s, 'a> {
    pub shown: &'s [&'a Song],
    pub total: usize,
}

impl<'s, 'a> ResultPage<'s, 'a> {
    pub fn new(results: &'s [&'a Song], cap: usize) -> Self {
        Self {
            shown: &results[..results.len().min(cap)],
            total: results.len(),
        }
    }

    pub fn hidden(&self) -> usize {
        self.total - self.shown.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.hidden() > 0
    }
}

pub fn render_html(results: &[&Song], cfg: &ViewConfig) -> String {
    let page = ResultPage::new(results, cfg.display_cap);
    let mut cards: Vec<String> = page.shown.iter().map(|s| card_html(s, cfg)).collect();
    if page.is_truncated() {
        cards.push(format!(
            r#"<div class="card"><p>{}</p></div>"#,
            escape_html(&excess_notice(cfg.display_cap))
        ));
    }
    cards.join("\n")
}

pub fn render_text(results: &[&Song], cfg: &ViewConfig) -> String {
    let page = ResultPage::new(results, cfg.display_cap);
    let mut lines: Vec<String> = page
        .shown
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{:>3}. {}", i + 1, card_text(s, cfg)))
        .collect();
    if page.is_truncated() {
        lines.push(excess_notice(cfg.display_cap));
    }
    lines.join("\n")
}

/// Results as a JSON array. JSON output is not capped.
pub fn render_json(results: &[&Song]) -> serde_json::Result<String> {
    let out: Vec<SongOutput> = results.iter().map(|s| SongOutput::from(*s)).collect();
    serde_json::to_string_pretty(&out)
}

/// `<option>` list for the artist dropdown, "all artists" first.
pub fn artist_options_html(artists: &[&str]) -> String {
    let mut out = format!(r#"<option value="">{}</option>"#, ALL_ARTISTS_LABEL);
    for a in artists {
        let a = escape_html(a);
        out.push_str(&format!(r#"<option value="{0}">{0}</option>"#, a));
    }
    out
}

// ============================================================================
// Sinks
// ============================================================================

/// Output target whose pieces may be missing.
///
/// Both methods return `false` and do nothing when their target is
/// unavailable; neither ever fails.
pub trait Sink {
    fn render_into(&mut self, body: &str) -> bool;
    fn set_message(&mut self, text: &str) -> bool;
}

/// Sink with no targets at all.
#[derive(Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn render_into(&mut self, _body: &str) -> bool {
        false
    }

    fn set_message(&mut self, _text: &str) -> bool {
        false
    }
}

/// In-memory sink that keeps the last body and message.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub body: Option<String>,
    pub message: Option<String>,
}

impl Sink for MemorySink {
    fn render_into(&mut self, body: &str) -> bool {
        self.body = Some(body.to_string());
        true
    }

    fn set_message(&mut self, text: &str) -> bool {
        self.message = Some(text.to_string());
        true
    }
}

/// Sink over two writers: one for the rendered body, one for messages.
pub struct WriterSink<B: Write, M: Write> {
    body: Option<B>,
    messages: Option<M>,
}

impl<B: Write, M: Write> WriterSink<B, M> {
    pub fn new(body: Option<B>, messages: Option<M>) -> Self {
        Self { body, messages }
    }

    pub fn into_parts(self) -> (Option<B>, Option<M>) {
        (self.body, self.messages)
    }
}

impl WriterSink<Stdout, Stderr> {
    /// Body on stdout, messages on stderr.
    pub fn console() -> Self {
        Self::new(Some(io::stdout()), Some(io::stderr()))
    }
}

fn write_line<W: Write>(target: &mut Option<W>, text: &str, what: &str) -> bool {
    let Some(w) = target.as_mut() else {
        return false;
    };
    match writeln!(w, "{}", text).and_then(|_| w.flush()) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "failed to write {}, disabling it", what);
            *target = None;
            false
        }
    }
}

impl<B: Write, M: Write> Sink for WriterSink<B, M> {
    fn render_into(&mut self, body: &str) -> bool {
        write_line(&mut self.body, body, "body")
    }

    fn set_message(&mut self, text: &str) -> bool {
        write_line(&mut self.messages, text, "message")
    }
}
