//! Platform batch orchestration and coordination.
//!
//! This module provides the [`Orchestrator`] that takes the files of one
//! platform through every stage:
//!
//! 1. Classifies each [`InputFile`](crate::bundler::InputFile)
//! 2. Stages entries and manifests under the platform's staging root
//! 3. Installs third-party dependencies and verifies the closure
//! 4. Finalizes the bundler configuration and runs the bundler
//! 5. Stitches chunks back into one artifact per input file
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_modules::bundler::{
//!     InputFile, LogSink, Orchestrator, PackageIdentity, SettingsBuilder,
//! };
//! use kodegen_bundler_modules::metadata::StaticRegistry;
//! use std::sync::Arc;
//!
//! # fn example() -> kodegen_bundler_modules::error::Result<()> {
//! let settings = SettingsBuilder::new().app_root("/srv/my-app").build()?;
//! let orchestrator = Orchestrator::new(settings, StaticRegistry::new())
//!     .with_sink(Arc::new(LogSink));
//!
//! let files = vec![InputFile::new(PackageIdentity::Application, "module.js", "1", "os")];
//! for artifact in orchestrator.process_files_for_target_blocking(&files)? {
//!     println!("{} ({} bytes)", artifact.source_path, artifact.data.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`context`] - Per-process build state (first-run tracking)
//! - [`orchestrator`] - Main [`Orchestrator`] struct and batch processing
//! - [`tool_detection`] - Locating npm and webpack executables

pub mod context;
mod orchestrator;
pub(crate) mod tool_detection;

pub use context::BuildContext;
pub use orchestrator::Orchestrator;
