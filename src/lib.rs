//! Module bundling orchestrator for a multi-package build system.
//!
//! Source files written with module syntax are grouped per target platform,
//! staged into a self-contained npm project, installed, compiled with webpack
//! into a shared chunk plus one chunk per entry point, and stitched back into
//! one artifact per input file. All packages of a platform reach the shared
//! chunk through a single namespace.
//!
//! The entry point is [`bundler::Orchestrator`]; settings come from
//! [`bundler::SettingsBuilder`] or [`metadata::load_settings`].

pub mod bundler;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, Result, Stage};
