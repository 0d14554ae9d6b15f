//! Side registry of packages known to the host.

use crate::error::{BundlerError, Result};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

/// Package facts the host build system knows and the bundler queries.
pub trait PackageRegistry: Send + Sync {
    /// Whether `package` is installed in the running application.
    fn is_installed(&self, package: &str) -> bool;

    /// Declared npm dependencies (`name -> version`) of `package`, or `None`
    /// if the registry has no record of it.
    fn npm_dependencies(&self, package: &str) -> Option<BTreeMap<String, String>>;
}

/// In-memory registry.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_modules::metadata::{PackageRegistry, StaticRegistry};
///
/// let registry = StaticRegistry::new()
///     .with_installed("rocket:module")
///     .with_package("acme:widgets", [("lodash", "3.8.0")]);
/// assert!(registry.is_installed("rocket:module"));
/// assert_eq!(registry.npm_dependencies("acme:widgets").unwrap()["lodash"], "3.8.0");
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticRegistry {
    #[serde(default)]
    installed: BTreeSet<String>,
    #[serde(default)]
    packages: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a package as installed in the application.
    pub fn with_installed(mut self, package: impl Into<String>) -> Self {
        self.installed.insert(package.into());
        self
    }

    /// Records a package and its npm dependencies.
    pub fn with_package<I, K, V>(mut self, package: impl Into<String>, deps: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.packages.insert(
            package.into(),
            deps.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        );
        self
    }
}

impl PackageRegistry for StaticRegistry {
    fn is_installed(&self, package: &str) -> bool {
        self.installed.contains(package)
    }

    fn npm_dependencies(&self, package: &str) -> Option<BTreeMap<String, String>> {
        self.packages.get(package).cloned()
    }
}

/// Loads a [`StaticRegistry`] from JSON:
///
/// ```json
/// {
///   "installed": ["rocket:module", "acme:widgets"],
///   "packages": { "acme:widgets": { "lodash": "3.8.0" } }
/// }
/// ```
pub fn load_registry(path: &Path) -> Result<StaticRegistry> {
    let text = std::fs::read_to_string(path).map_err(|e| BundlerError::Config {
        reason: format!("Failed to read {}: {}", path.display(), e),
    })?;
    serde_json::from_str(&text).map_err(|e| BundlerError::Config {
        reason: format!("Failed to parse package registry {}: {}", path.display(), e),
    })
}
