//! Local thumbnail cache.
//!
//! Artifacts live where RetroArch expects them; a JSON manifest next to them
//! records which remote entry each file was fetched from, which is what makes
//! re-runs idempotent.

mod atomic;
mod manifest;
mod store;

pub use manifest::{Manifest, ManifestRecord, MANIFEST_VERSION};
pub use store::ThumbnailStore;
