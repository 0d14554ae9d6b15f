//! Settings files and the package registry.
//!
//! Settings live in a TOML file with a `[bundler]` table. Every key is
//! optional; `app_root` defaults to the directory containing the file.
//!
//! ```toml
//! [bundler]
//! own_package = "rocket:module"
//! namespace = "RocketModule"
//! unclassified = "warn"
//!
//! [bundler.npm]
//! loglevel = "silent"
//!
//! [bundler.tool_dependencies]
//! webpack = "^1.9.10"
//!
//! [bundler.platforms."web.cordova"]
//! ambient_global = true
//! links_shared_namespace = false
//! ```

pub mod registry;

pub use registry::{PackageRegistry, StaticRegistry, load_registry};

use crate::bundler::{
    NpmSettings, PackageIdentity, PlatformCapabilities, Settings, SettingsBuilder,
    UnclassifiedPolicy, WebpackSettings,
};
use crate::error::{BundlerError, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    bundler: BundlerTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BundlerTable {
    app_root: Option<PathBuf>,
    staging_base: Option<PathBuf>,
    own_package: Option<String>,
    namespace: Option<String>,
    entry_suffix: Option<String>,
    shared_modules_file: Option<String>,
    browser_global: Option<String>,
    tool_dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    npm: NpmSettings,
    #[serde(default)]
    webpack: WebpackSettings,
    #[serde(default)]
    unclassified: UnclassifiedPolicy,
    #[serde(default)]
    reset_on_first_run: bool,
    #[serde(default)]
    platforms: BTreeMap<String, PlatformCapabilities>,
}

/// Loads [`Settings`] from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path).map_err(|e| BundlerError::Config {
        reason: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_settings(&text, base)
}

/// Parses settings TOML; relative paths are resolved against `base`.
pub fn parse_settings(text: &str, base: &Path) -> Result<Settings> {
    let file: SettingsFile = toml::from_str(text).map_err(|e| BundlerError::Config {
        reason: format!("Failed to parse settings: {}", e),
    })?;
    let table = file.bundler;

    let app_root = match table.app_root {
        Some(root) => base.join(root),
        None => base.to_path_buf(),
    };

    let mut builder = SettingsBuilder::new()
        .app_root(&app_root)
        .npm(table.npm)
        .webpack(table.webpack)
        .unclassified_policy(table.unclassified)
        .reset_on_first_run(table.reset_on_first_run);

    if let Some(staging_base) = table.staging_base {
        builder = builder.staging_base(base.join(staging_base));
    }
    if let Some(name) = table.own_package {
        let package = PackageIdentity::parse(&name).map_err(|e| BundlerError::Config {
            reason: e.to_string(),
        })?;
        builder = builder.own_package(package);
    }
    if let Some(namespace) = table.namespace {
        builder = builder.namespace(namespace);
    }
    if let Some(suffix) = table.entry_suffix {
        builder = builder.entry_suffix(suffix);
    }
    if let Some(file) = table.shared_modules_file {
        builder = builder.shared_modules_file(file);
    }
    if let Some(global) = table.browser_global {
        builder = builder.browser_global(global);
    }
    if let Some(deps) = table.tool_dependencies {
        builder = builder.tool_dependencies(deps);
    }
    for (tag, capabilities) in table.platforms {
        builder = builder.platform_capabilities(tag, capabilities);
    }

    builder.build().map_err(|e| BundlerError::Config {
        reason: e.to_string(),
    })
}
