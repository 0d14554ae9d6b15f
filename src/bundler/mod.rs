//! Core bundling pipeline.
//!
//! One platform batch flows through these modules in order:
//!
//! - [`input`] - classification of each input file into a [`FileKind`]
//! - [`staging`] - staging root layout, entry sources and package manifests
//! - [`install`] - third-party dependency installation and closure checks
//! - [`config`] - the bundler configuration built up along the way
//! - [`invoke`] - running the bundling tool
//! - [`stitch`] - turning chunks back into one [`BuiltArtifact`] per input
//!
//! [`builder`] ties them together in the [`Orchestrator`].

pub mod artifact;
pub mod builder;
pub mod config;
pub mod error;
pub mod input;
pub mod install;
pub mod invoke;
pub mod settings;
pub mod staging;
pub mod stitch;
pub mod utils;

pub use artifact::BuiltArtifact;
pub use builder::{BuildContext, Orchestrator};
pub use config::BundleConfig;
pub use error::{CompileDiagnostic, Context, Error, ErrorExt, Result};
pub use input::{FileInfo, FileKind, InputFile, classify};
pub use install::{
    CaptureSink, DependencyInstaller, LogSink, NpmInstaller, NullSink, OutputSink, OutputStream,
};
pub use invoke::{BundleTool, WebpackCli};
pub use settings::{
    APP_STAGING_NAME, NpmSettings, PackageIdentity, Platform, PlatformCapabilities, Settings,
    SettingsBuilder, StagingName, UnclassifiedPolicy, WebpackSettings,
};
pub use stitch::Stitcher;
