//! CLI parsing and orchestration. Resolves the site, lists chapters, resolves pages. Maps errors to exit codes.

use crate::config::{self, ConfigError};
use crate::grabber::{resolve_site, Grabber, GrabberError, HttpClient, SiteGrabber};
use crate::model::{filter_language, filter_range, sort_by_number, Chapter, ResolvedChapter};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Grabber(#[from] GrabberError),

    #[error("{0}")]
    Output(String),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Config(_) => 1,
            CliRunError::Grabber(_) => 2,
            CliRunError::Output(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mangagrab")]
#[command(about = "List a manga's chapters and resolve their page image URLs")]
#[command(
    after_help = "Config file keys (language, user_agent, timeout_secs) are read from ./mangagrab.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// Manga URL (e.g. https://mangadex.org/title/<uuid>/<slug>).
    pub url: String,

    /// Preferred language code for the title and chapter feed (e.g. en, es, pt-br).
    #[arg(short, long)]
    pub language: Option<String>,

    /// Only chapters whose number is in this range (inclusive), e.g. 1-10 or 2.5-3.
    #[arg(long, value_parser = parse_chapter_range)]
    pub chapters: Option<(f64, f64)>,

    /// Print the chapter list and exit without resolving pages.
    #[arg(long)]
    pub list: bool,

    /// Sort chapters by number instead of keeping feed order (volume, then chapter).
    #[arg(long)]
    pub sort: bool,

    /// Print resolved chapters as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and full error chain.
    #[arg(long)]
    pub verbose: bool,
}

fn parse_chapter_range(s: &str) -> Result<(f64, f64), String> {
    let s = s.trim();
    let (from_str, to_str) = s.split_once('-').ok_or_else(|| {
        format!(
            "Invalid --chapters: expected 'from-to' (e.g. 1-10), got '{}'",
            s
        )
    })?;
    let from_str = from_str.trim();
    let to_str = to_str.trim();
    let from: f64 = from_str.parse().map_err(|_| {
        format!(
            "Invalid --chapters: '{}' is not a valid start chapter number",
            from_str
        )
    })?;
    let to: f64 = to_str.parse().map_err(|_| {
        format!(
            "Invalid --chapters: '{}' is not a valid end chapter number",
            to_str
        )
    })?;
    if from > to {
        return Err(format!(
            "Invalid --chapters: start ({}) must be <= end ({})",
            from, to
        ));
    }
    Ok((from, to))
}

/// Narrow the feed to the chapters the user asked for. Feed order is kept unless `sort` is set.
fn select_chapters(
    chapters: Vec<Chapter>,
    language: Option<&str>,
    range: Option<(f64, f64)>,
    sort: bool,
) -> Vec<Chapter> {
    let mut chapters = filter_language(chapters, language.unwrap_or(""));
    if let Some((from, to)) = range {
        chapters = filter_range(chapters, from, to);
    }
    if sort {
        sort_by_number(&mut chapters);
    }
    chapters
}

/// The bar draws on stderr; JSON runs stay silent like quiet ones.
fn show_progress(args: &Args) -> bool {
    !args.quiet && !args.json
}

fn format_listing(chapter: &Chapter) -> String {
    format!(
        "{:>8}  [{}]  {}",
        chapter.number(),
        chapter.language(),
        chapter.title()
    )
}

fn write_pages(out: &mut impl Write, chapters: &[ResolvedChapter]) -> std::io::Result<()> {
    for chapter in chapters {
        writeln!(out, "# {} ({} pages)", chapter.title, chapter.pages_count())?;
        for page in &chapter.pages {
            writeln!(out, "{:>4} {}", page.number, page.url)?;
        }
    }
    Ok(())
}

fn output_error(e: impl std::fmt::Display) -> CliRunError {
    CliRunError::Output(format!("Failed to write output: {}", e))
}

fn progress_bar(total: usize) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(total as u64);
    if let Ok(style) = indicatif::ProgressStyle::default_bar()
        .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
    {
        bar.set_style(
            style
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    resolve_site(&args.url).map_err(|e| {
        CliRunError::InvalidInput(format!(
            "{}. Supported: MangaDex (https://mangadex.org/title/<uuid>/...).",
            e
        ))
    })?;

    let config = config::load_config()?;

    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    let timeout_secs = args
        .timeout
        .or_else(|| config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));
    let language = args
        .language
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.language.clone()));

    let mut builder = HttpClient::builder().timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let mut grabber = SiteGrabber::for_url(&args.url, language.as_deref(), &mut client)
        .map_err(|e| match e {
            GrabberError::MissingMangaId { .. } | GrabberError::InvalidUrl { .. } => {
                CliRunError::InvalidInput(e.to_string())
            }
            other => CliRunError::Grabber(other),
        })?;

    let title = grabber.title()?;
    if !args.quiet {
        eprintln!("{}", title);
    }

    let chapters = select_chapters(
        grabber.fetch_chapters()?,
        language.as_deref(),
        args.chapters,
        args.sort,
    );
    info!(site = grabber.site().name(), count = chapters.len(), "selected chapters");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.list {
        for chapter in &chapters {
            writeln!(out, "{}", format_listing(chapter)).map_err(output_error)?;
        }
        return Ok(());
    }

    if chapters.is_empty() {
        return Err(CliRunError::InvalidInput(
            "No chapters match the requested language and range.".to_string(),
        ));
    }

    let bar = if show_progress(args) {
        Some(progress_bar(chapters.len()))
    } else {
        None
    };
    let mut resolved = Vec::with_capacity(chapters.len());
    for (i, chapter) in chapters.iter().enumerate() {
        if let Some(bar) = &bar {
            bar.set_message(format!("Resolving chapter {}", chapter.number()));
        }
        resolved.push(grabber.fetch_chapter(chapter)?);
        if let Some(bar) = &bar {
            bar.set_position(i as u64 + 1);
        }
    }
    if let Some(bar) = bar {
        bar.disable_steady_tick();
        bar.finish_and_clear();
    }

    if args.json {
        serde_json::to_writer_pretty(&mut out, &resolved).map_err(output_error)?;
        writeln!(out).map_err(output_error)?;
    } else {
        write_pages(&mut out, &resolved).map_err(output_error)?;
    }
    Ok(())
}
