//! Argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ideals_core::sync::SyncPolicy;
use ideals_session::ImportResolution;

#[derive(Debug, Parser)]
#[command(name = "ideals", version, about = "Track progress against shared checklist templates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List stored profiles
    List,
    /// Create a profile and load it
    Create {
        /// Display name (pass after `--` if it starts with a hyphen)
        name: String,
        /// URL serving the template JSON
        template_url: String,
        /// Id the fetched template must carry
        template_id: String,
        /// Track a count per item instead of a done flag
        #[arg(long)]
        count: bool,
    },
    /// Load and reconcile a profile
    Load {
        id: String,
        /// Keep items the template removed
        #[arg(long, conflicts_with = "cleanup")]
        keep: bool,
        /// Drop items the template removed
        #[arg(long)]
        cleanup: bool,
    },
    /// Flip an item's done flag
    Toggle {
        id: String,
        collection: String,
        item: String,
    },
    /// Set an item's count (count mode)
    Count {
        id: String,
        collection: String,
        item: String,
        count: u64,
    },
    /// Write the profile to a JSON file
    Export {
        id: String,
        /// Output directory (defaults to the current one)
        dir: Option<PathBuf>,
    },
    /// Import a profile JSON file
    Import {
        file: PathBuf,
        /// Replace a stored profile with the same id
        #[arg(long, conflicts_with = "duplicate")]
        overwrite: bool,
        /// Store the import under a fresh id
        #[arg(long)]
        duplicate: bool,
    },
    /// Delete a profile
    Delete { id: String },
}

/// Sync policy chosen by `--keep` / `--cleanup`, if any.
pub fn sync_policy(keep: bool, cleanup: bool) -> Option<SyncPolicy> {
    match (keep, cleanup) {
        (_, true) => Some(SyncPolicy::Cleanup),
        (true, false) => Some(SyncPolicy::Additive),
        (false, false) => None,
    }
}

/// Conflict resolution chosen by `--overwrite` / `--duplicate`, if any.
pub fn import_resolution(overwrite: bool, duplicate: bool) -> Option<ImportResolution> {
    match (overwrite, duplicate) {
        (_, true) => Some(ImportResolution::Duplicate),
        (true, false) => Some(ImportResolution::Overwrite),
        (false, false) => None,
    }
}
