use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use playlist_search::catalog::{Catalog, CatalogSource};
use playlist_search::debounce::Debouncer;
use playlist_search::models::{SearchStats, Song};
use playlist_search::progress::{format_elapsed, hide_spinners, load_spinner};
use playlist_search::render::{
    self, Sink, ViewConfig, WriterSink, DEFAULT_DISPLAY_CAP, DEFAULT_RECENT_COUNT,
    DEFAULT_SEPARATOR, LOADING_MESSAGE,
};
use playlist_search::safety::validate_output_path;
use playlist_search::Search;
use std::fs::File;
use std::io::{self, BufRead, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "playlist-search")]
#[command(about = "Search a song playlist by keyword and artist")]
struct Args {
    /// Song list: a JSON file path or an http(s) URL
    source: String,

    /// Free-text keyword matched against artists and title
    #[arg(short, long, default_value = "")]
    query: String,

    /// Exact artist name (as listed by --list-artists)
    #[arg(long, default_value = "")]
    artist: String,

    /// Maximum number of cards shown
    #[arg(long, default_value_t = DEFAULT_DISPLAY_CAP)]
    limit: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Separator between artist names on a card
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    separator: String,

    /// Omit Instagram embed blocks from HTML cards
    #[arg(long)]
    no_embed: bool,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the artist dropdown options and exit
    #[arg(long)]
    list_artists: bool,

    /// Show the most recently added songs instead of searching (default 6)
    #[arg(long, num_args = 0..=1)]
    recent: Option<Option<usize>>,

    /// Read queries from stdin, one per line, searching once input settles
    #[arg(long)]
    interactive: bool,

    /// Settling delay for --interactive
    #[arg(long, default_value = "200")]
    debounce_ms: u64,

    /// Print run statistics as JSON to stderr
    #[arg(long)]
    stats: bool,

    /// Hide spinners (tail-friendly output)
    #[arg(long)]
    log_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
    Json,
}

type SharedSink = Arc<Mutex<Box<dyn Sink + Send>>>;

/// How a run ended when it did not hit an unexpected error.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Done,
    LoadFailed,
}

/// Results sink. Creating the output file truncates it, so this only runs
/// once the song list has loaded.
fn open_sink(output: Option<&Path>) -> Result<Box<dyn Sink + Send>> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Ok(Box::new(WriterSink::new(
                Some(BufWriter::new(file)),
                Some(io::stderr()),
            )))
        }
        None => Ok(Box::new(WriterSink::console())),
    }
}

fn render_body(results: &[&Song], cfg: &ViewConfig, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render::render_text(results, cfg),
        OutputFormat::Html => render::render_html(results, cfg),
        OutputFormat::Json => render::render_json(results)?,
    })
}

/// Render one result set into the sink and return its stats.
fn present(
    sink: &mut dyn Sink,
    catalog: &Catalog,
    results: &[&Song],
    cfg: &ViewConfig,
    format: OutputFormat,
) -> Result<SearchStats> {
    let start = Instant::now();
    let body = render_body(results, cfg, format)?;
    sink.render_into(&body);
    sink.set_message(&render::status_message(results.len()));

    let displayed = match format {
        OutputFormat::Json => results.len(),
        _ => results.len().min(cfg.display_cap),
    };
    Ok(SearchStats {
        total_songs: catalog.len(),
        matched: results.len(),
        displayed,
        hidden_by_cap: results.len() - displayed,
        distinct_artists: catalog.artists().len(),
        songs_without_reel: results.iter().filter(|s| s.reel_link().is_none()).count(),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

fn list_artists(sink: &mut dyn Sink, catalog: &Catalog, format: OutputFormat) -> Result<()> {
    let artists = catalog.artists();
    let body = match format {
        OutputFormat::Text => artists.join("\n"),
        OutputFormat::Html => render::artist_options_html(&artists),
        OutputFormat::Json => serde_json::to_string_pretty(&artists)?,
    };
    sink.render_into(&body);
    sink.set_message(&format!("{} artists", artists.len()));
    Ok(())
}

/// Read queries from stdin; only the last query of each burst is searched.
fn run_interactive(
    catalog: Arc<Catalog>,
    sink: SharedSink,
    base: Search,
    cfg: ViewConfig,
    format: OutputFormat,
    delay: Duration,
) -> Result<()> {
    let mut debouncer = Debouncer::new()?;
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read query from stdin")?;
        let search = Search {
            query: line,
            artist: base.artist.clone(),
        };
        let catalog = Arc::clone(&catalog);
        let sink = Arc::clone(&sink);
        let cfg = cfg.clone();

        debug!(query = %search.query, "query input");
        debouncer.start(delay, move || {
            let results = catalog.search(&search);
            let mut sink = match sink.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(e) = present(&mut **sink, &catalog, &results, &cfg, format) {
                error!(error = %e, "failed to render results");
            }
        })?;
    }

    // End of input acts like Enter: search whatever is still pending
    debouncer.flush()?;
    Ok(())
}

/// Load the song list, reporting progress and any failure on `status`.
/// A failure is reported there and nowhere else.
fn load_catalog(source: CatalogSource, status: &mut dyn Sink) -> Option<Catalog> {
    status.set_message(LOADING_MESSAGE);

    let start = Instant::now();
    let spinner = load_spinner(&source);
    let loaded = Catalog::load(source);
    spinner.finish_and_clear();

    match loaded {
        Ok(catalog) => {
            info!(
                songs = catalog.len(),
                elapsed = %format_elapsed(start.elapsed()),
                "song list ready"
            );
            Some(catalog)
        }
        Err(e) => {
            status.set_message(&render::load_failed_message(&e));
            None
        }
    }
}

fn run(args: Args) -> Result<Outcome> {
    hide_spinners(args.log_only);

    let cfg = ViewConfig {
        display_cap: args.limit,
        separator: args.separator.clone(),
        embed_reels: !args.no_embed,
    };

    let source = CatalogSource::parse(&args.source);
    if let Some(path) = &args.output {
        validate_output_path(path, source.as_path())?;
    }

    // Load status goes to stderr only; stdout and --output stay results-only
    let mut status = WriterSink::<io::Stdout, io::Stderr>::new(None, Some(io::stderr()));
    let Some(catalog) = load_catalog(source, &mut status) else {
        return Ok(Outcome::LoadFailed);
    };

    let mut sink = open_sink(args.output.as_deref())?;

    if args.list_artists {
        list_artists(sink.as_mut(), &catalog, args.format)?;
        return Ok(Outcome::Done);
    }

    let search = Search::new(args.query.clone()).with_artist(args.artist.clone());

    if args.interactive {
        let delay = Duration::from_millis(args.debounce_ms);
        let sink: SharedSink = Arc::new(Mutex::new(sink));
        run_interactive(Arc::new(catalog), sink, search, cfg, args.format, delay)?;
        return Ok(Outcome::Done);
    }

    let results: Vec<&Song> = match args.recent {
        Some(count) => {
            let count = count.unwrap_or(DEFAULT_RECENT_COUNT);
            render::recent_songs(catalog.songs(), count)
                .into_iter()
                .filter(|s| search.accepts(s))
                .collect()
        }
        None => catalog.search(&search),
    };

    let stats = present(sink.as_mut(), &catalog, &results, &cfg, args.format)?;
    if args.stats {
        stats.log();
        eprintln!("Match rate: {:.1}%", stats.match_rate());
    }

    Ok(Outcome::Done)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // The load failure was already reported through the status sink
    Ok(match run(Args::parse())? {
        Outcome::Done => ExitCode::SUCCESS,
        Outcome::LoadFailed => ExitCode::FAILURE,
    })
}
