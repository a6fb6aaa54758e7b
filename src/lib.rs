//! # Snapsweep
//!
//! Swipe-style photo cleanup: review photos one by one, mark the ones to
//! drop, then delete the whole batch and track the space you got back.
//!
//! This crate re-exports the core library and ships the `snapsweep`
//! command-line binary.
//!
//! ## Features
//!
//! - Scan directories for photos, newest first, with cursor pagination
//! - Review photos one by one and mark them for deletion
//! - Batch size estimation with a wall-clock budget
//! - Append-only deletion statistics across sessions
//!
//! ## Usage
//!
//! ### Command Line
//!
//! ```bash
//! # List photos in the current directory
//! snapsweep scan
//!
//! # Review photos and delete the marked batch
//! snapsweep sweep ~/Pictures
//!
//! # See what a sweep would delete without deleting
//! snapsweep sweep --all --dry-run
//!
//! # Lifetime statistics
//! snapsweep stats
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use snapsweep_core::{FsPhotoLibrary, LibraryConfig, PhotoFeed};
//!
//! let library = FsPhotoLibrary::open(".", &LibraryConfig::default())?;
//!
//! let mut feed = PhotoFeed::new(50);
//! feed.load(&library, false)?;
//! for asset in feed.assets() {
//!     println!("{}", asset.file_name());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

// Re-export core functionality
pub use snapsweep_core::*;

// Re-export commonly used types
pub use snapsweep_core::{
    Asset, BatchSizeEstimator, DeletionList, EstimatorConfig, FsPhotoLibrary, LibraryConfig,
    PhotoFeed, PhotoSweeper, StatisticsLedger, SweepConfig, SweepResult,
};
