//! Terminal feedback while the song list is being read or downloaded.
//!
//! `--log-only` turns the spinner off so piped runs only carry results on
//! stdout and log lines on stderr.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static SPINNERS_HIDDEN: AtomicBool = AtomicBool::new(false);

pub fn hide_spinners(hidden: bool) {
    SPINNERS_HIDDEN.store(hidden, Ordering::Relaxed);
}

pub fn spinners_hidden() -> bool {
    SPINNERS_HIDDEN.load(Ordering::Relaxed)
}

/// Load time as shown in the "song list ready" log line.
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Spinner shown on stderr until the catalog from `source` is in memory.
pub fn load_spinner(source: &dyn Display) -> ProgressBar {
    let pb = if spinners_hidden() {
        ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
    } else {
        let pb = ProgressBar::new_spinner().with_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    pb.set_message(format!("Reading {}", source));
    pb
}
