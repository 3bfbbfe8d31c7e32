//! retrofuzz - download libretro thumbnails for a RetroArch playlist.
//!
//! Reads the playlist and thumbnail directories from `retroarch.cfg`, matches
//! every playlist label against the thumbnail server's names for one system
//! and downloads the best matches into RetroArch's thumbnail cache.

mod report;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use retrofuzz_core::config::parse_min_score;
use retrofuzz_core::playlist::{load_playlist, resolve_playlist};
use retrofuzz_core::retroarch::{default_cfg_path, load_paths};
use retrofuzz_core::{
    CancellationToken, CatalogSource, DownloadManager, DryRunExecutor, MatchConfig, MergePolicy,
    NormalizeConfig, Orchestrator, RetrofuzzError, ScoreConfig, ThumbnailFetcher, ThumbnailServer,
    ThumbnailStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "retrofuzz")]
#[command(version, about = "Fuzzy-matching thumbnail downloader for RetroArch playlists")]
struct Args {
    /// RetroArch configuration file
    cfg: Option<PathBuf>,

    /// Playlist name, with or without .lpl (required with several playlists)
    #[arg(short, long)]
    playlist: Option<String>,

    /// Thumbnail server system (defaults to the playlist name)
    #[arg(short, long)]
    system: Option<String>,

    /// Minimum match score 0-100, or "exact"
    #[arg(long, default_value_t = ScoreConfig::DEFAULT_MIN, value_parser = parse_score)]
    score: u8,

    /// Maximum thumbnails per label (ties at the limit are all kept)
    #[arg(long, default_value_t = ScoreConfig::DEFAULT_LIMIT)]
    limit: usize,

    /// Ignore (...) groups when matching
    #[arg(long)]
    no_meta: bool,

    /// Consider [...] groups when matching
    #[arg(long)]
    hack: bool,

    /// Ignore subtitles after " - ", ": " or "_ "
    #[arg(long)]
    no_subtitle: bool,

    /// Remove spaces before matching
    #[arg(long)]
    rmspaces: bool,

    /// Capitalize words when spaces are removed
    #[arg(long, requires = "rmspaces")]
    capitalize: bool,

    /// Only match the label text before this marker
    #[arg(long)]
    before: Option<String>,

    /// Whether to add thumbnails next to existing ones
    #[arg(long, value_enum, default_value_t = MergeArg::OnSourceChange)]
    merge: MergeArg,

    /// Only process labels matching this glob, replacing their thumbnails
    #[arg(long = "filter", value_name = "GLOB")]
    filters: Vec<String>,

    /// Replace thumbnails of labels matching this glob
    #[arg(long = "reset", value_name = "GLOB")]
    resets: Vec<String>,

    /// Ignore candidates that share almost no prefix with the label
    #[arg(long)]
    prefix_guard: bool,

    /// Plan and report without touching the cache
    #[arg(long)]
    dry_run: bool,

    /// Print every decision per label
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Thumbnail server URL
    #[arg(long)]
    server: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MergeArg {
    Allow,
    Suppress,
    OnSourceChange,
}

impl From<MergeArg> for MergePolicy {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Allow => MergePolicy::Allow,
            MergeArg::Suppress => MergePolicy::Suppress,
            MergeArg::OnSourceChange => MergePolicy::OnSourceChange,
        }
    }
}

fn parse_score(value: &str) -> std::result::Result<u8, String> {
    parse_min_score(value).map_err(|e| e.to_string())
}

impl Args {
    fn match_config(&self) -> MatchConfig {
        let normalize = NormalizeConfig {
            strip_round: self.no_meta,
            keep_square: self.hack,
            strip_subtitle: self.no_subtitle,
            remove_spaces: self.rmspaces,
            capitalize_words: self.capitalize,
            before: self.before.clone(),
            ..NormalizeConfig::default()
        };
        let reset_patterns = self.filters.iter().chain(&self.resets).cloned().collect();

        MatchConfig::new()
            .with_normalize(normalize)
            .with_min_score(self.score)
            .with_limit(self.limit)
            .with_prefix_guard(self.prefix_guard)
            .with_merge(self.merge.into())
            .with_reset_patterns(reset_patterns)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let cfg = match &args.cfg {
        Some(path) => path.clone(),
        None => default_cfg_path().context("Could not determine the RetroArch config directory")?,
    };
    let paths = load_paths(&cfg)?;
    info!("Using {}", cfg.display());

    let playlist_path = resolve_playlist(&paths.playlist_directory, args.playlist.as_deref())?;
    let playlist = load_playlist(&playlist_path)?;

    let server = match &args.server {
        Some(url) => ThumbnailServer::with_base_url(url.as_str())?,
        None => ThumbnailServer::new()?,
    };
    let systems = server.categories().await?;
    let system = match &args.system {
        Some(system) if systems.contains(system) => system.clone(),
        Some(system) => {
            return Err(RetrofuzzError::UnknownSystem {
                name: system.clone(),
            }
            .into())
        }
        None if systems.contains(&playlist.name) => playlist.name.clone(),
        None => {
            return Err(RetrofuzzError::UnknownSystem {
                name: playlist.name.clone(),
            })
            .context("The playlist name is not a server system, choose one with --system")
        }
    };

    let entries = server.entries(&system).await?;
    if entries.is_empty() {
        anyhow::bail!("{} has no thumbnails on {}", system, server.base_url());
    }
    debug!("{} names for {}", entries.len(), system);

    let store = Arc::new(ThumbnailStore::open(&paths.thumbnails_directory, &playlist.name)?);
    let source_changed = store.source_changed(&system)?;
    if source_changed {
        warn!(
            "{} was first filled from {}, not {}",
            playlist.name,
            store.source()?.unwrap_or_default(),
            system
        );
    }

    let orchestrator = Orchestrator::new(args.match_config(), system.as_str(), entries)?
        .with_scope(&args.filters)?
        .with_source_changed(source_changed);

    let plan = orchestrator.plan(&playlist.labels, store.as_ref())?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current download");
            signal_token.cancel();
        }
    });

    let run_report = if args.dry_run {
        plan.execute(&DryRunExecutor, &cancel).await
    } else {
        let fetcher = ThumbnailFetcher::new(
            store.clone(),
            DownloadManager::new()?,
            server.base_url(),
            cancel.clone(),
        );
        let run_report = plan.execute(&fetcher, &cancel).await;
        if run_report.summary.fetched > 0 {
            store.record_source(&system)?;
        }
        run_report
    };

    report::print(&run_report, args.verbose, args.dry_run);
    Ok(())
}
