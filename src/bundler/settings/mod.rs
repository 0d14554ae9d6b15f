//! Configuration structures for module bundling.
//!
//! This module provides the settings consumed by every stage of a platform
//! batch: package identities, platform capabilities, external tool settings
//! and a builder for constructing them.

mod builder;
mod core;
mod package;
mod platform;
mod tooling;

pub use builder::{DEFAULT_NAMESPACE, DEFAULT_OWN_PACKAGE, DEFAULT_STAGING_DIR, SettingsBuilder};
pub use core::Settings;
pub use package::{APP_STAGING_NAME, PackageIdentity, StagingName};
pub use platform::{Platform, PlatformCapabilities};
pub use tooling::{NpmSettings, UnclassifiedPolicy, WebpackSettings};
