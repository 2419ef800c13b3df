//! Core domain logic for the ideals tracker.
//!
//! Provides the template and profile schemas with their validators, the
//! profile/template diff and sync engines, and export naming. Everything in
//! this crate is pure: no I/O, no environment access.

pub mod diff;
pub mod error;
pub mod export;
pub mod flags;
pub mod id;
pub mod profile;
pub mod sync;
pub mod template;
pub mod types;
pub mod validation;
