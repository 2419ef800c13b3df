//! Profile sessions: loading a profile, reconciling it with its template,
//! editing it, and managing the set of stored profiles.
//!
//! - [`ActiveProfile`]: the load state machine and mutations for the
//!   profile currently on screen.
//! - [`ProfileLibrary`]: create, import, export, rename and delete
//!   profiles, plus the active selection.
//! - [`Tracker`]: both of the above behind one value, keeping them in
//!   step.

pub mod active;
pub mod config;
pub mod error;
pub mod library;
pub mod state;
pub mod tracker;

pub use active::ActiveProfile;
pub use config::SessionConfig;
pub use error::SessionError;
pub use library::{ExportedProfile, ImportOutcome, ImportResolution, ProfileLibrary};
pub use state::{LoadError, LoadOutcome, LoadStatus, SessionSnapshot};
pub use tracker::Tracker;
