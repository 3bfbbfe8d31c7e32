//! Retrofuzz Core - Headless library for fuzzy-matching RetroArch playlist
//! labels to libretro thumbnail names.
//!
//! Labels in a playlist rarely spell a game exactly the way the thumbnail
//! server does. This crate normalizes both sides, scores every pair, chooses
//! the best candidates per label and reconciles them against what is already
//! cached on disk. The binary lives in the `retrofuzz-cli` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use retrofuzz_core::{
//!     CancellationToken, CatalogSource, MatchConfig, Orchestrator, ThumbnailServer,
//!     ThumbnailStore, DryRunExecutor,
//! };
//!
//! #[tokio::main]
//! async fn main() -> retrofuzz_core::Result<()> {
//!     let playlist = retrofuzz_core::playlist::load_playlist("Nintendo - Game Boy.lpl".as_ref())?;
//!     let server = ThumbnailServer::new()?;
//!     let entries = server.entries(&playlist.name).await?;
//!
//!     let store = ThumbnailStore::open("/data/thumbnails".as_ref(), &playlist.name)?;
//!     let orchestrator = Orchestrator::new(MatchConfig::default(), &playlist.name, entries)?;
//!     let report = orchestrator
//!         .run(&playlist.labels, &store, &DryRunExecutor, &CancellationToken::new())
//!         .await?;
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod matcher;
pub mod model;
pub mod naming;
pub mod network;
pub mod normalize;
pub mod orchestrator;
pub mod playlist;
pub mod reconcile;
pub mod retroarch;
pub mod selector;
pub mod traits;

// Re-export commonly used types
pub use cache::ThumbnailStore;
pub use cancel::{CancellationToken, CancelledError};
pub use catalog::ThumbnailServer;
pub use config::{MatchConfig, MergePolicy, NormalizeConfig, ScoreConfig};
pub use error::{Result, RetrofuzzError};
pub use executor::{DryRunExecutor, ThumbnailFetcher};
pub use filter::LabelFilter;
pub use matcher::{score, MatchResult};
pub use model::{CacheEntry, Decision, KeepReason, Label, RemoteEntry, SkipReason, ThumbnailKind};
pub use network::DownloadManager;
pub use normalize::{normalize, normalize_with_notes};
pub use orchestrator::{LabelPlan, Orchestrator, Plan, RunReport, RunSummary, Status};
pub use playlist::Playlist;
pub use retroarch::RetroArchPaths;
pub use traits::{ArtifactDownloader, CacheInspector, CatalogSource, DecisionExecutor};
