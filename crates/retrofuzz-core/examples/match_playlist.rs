//! Basic usage example - match a playlist against the thumbnail server
//! without touching the cache.

use retrofuzz_core::playlist::load_playlist;
use retrofuzz_core::{CatalogSource, MatchConfig, Orchestrator, Result, ThumbnailServer};
use std::path::PathBuf;

struct NothingCached;

impl retrofuzz_core::CacheInspector for NothingCached {
    fn cached_entries(&self, _label: &retrofuzz_core::Label) -> Result<Vec<retrofuzz_core::CacheEntry>> {
        Ok(Vec::new())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Get playlist from args or use a typical location
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./playlists/Nintendo - Game Boy.lpl"));

    let playlist = load_playlist(&path)?;
    println!("{}: {} labels", playlist.name, playlist.labels.len());

    let server = ThumbnailServer::new()?;
    let entries = server.entries(&playlist.name).await?;
    println!("{} thumbnail names on the server", entries.len());

    let orchestrator = Orchestrator::new(MatchConfig::default(), playlist.name.as_str(), entries)?;
    let plan = orchestrator.plan(&playlist.labels, &NothingCached)?;

    for label in &plan.labels {
        match &label.best {
            Some(best) => println!("{:>3}% {} -> {}", best.score, label.label.text, best.remote),
            None => println!("  0% {}", label.label.text),
        }
    }

    Ok(())
}
