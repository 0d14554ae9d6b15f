//! Package manifests written into a staging root.

use crate::bundler::{error::Result, settings::StagingName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version every staged package declares; npm requires one.
pub const STAGED_PACKAGE_VERSION: &str = "0.0.0";

/// `packages/<staging name>/package.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Staging name of the package.
    pub name: String,
    /// Always [`STAGED_PACKAGE_VERSION`].
    pub version: String,
    /// Third-party dependencies with normalized constraints.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Builds a manifest, normalizing every constraint.
    pub fn new(name: &StagingName, dependencies: &BTreeMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            version: STAGED_PACKAGE_VERSION.to_string(),
            dependencies: dependencies
                .iter()
                .map(|(dep, version)| (dep.clone(), normalize_constraint(version)))
                .collect(),
        }
    }
}

/// Top-level `package.json` of a staging root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLevelManifest {
    /// `<staging name>` -> `file:./packages/<staging name>`.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Tooling the generated bundler config needs at build time.
    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl TopLevelManifest {
    /// Registers a staged package as a local-path dependency.
    pub fn add_local_package(&mut self, name: &StagingName) {
        self.dependencies
            .insert(name.to_string(), format!("file:./packages/{}", name));
    }
}

/// Serializes a manifest deterministically: sorted keys, two-space indent,
/// trailing newline.
pub fn to_manifest_json<T: Serialize>(manifest: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    Ok(json)
}

/// Turns an exact version into a caret constraint compatible with its major
/// version.
///
/// Constraints that are already ranges, dist-tags, URLs or paths are kept as
/// they are.
///
/// ```
/// use kodegen_bundler_modules::bundler::staging::normalize_constraint;
///
/// assert_eq!(normalize_constraint("3.8.0"), "^3.8.0");
/// assert_eq!(normalize_constraint("~1.2.0"), "~1.2.0");
/// assert_eq!(normalize_constraint("git+https://example.com/x.git"), "git+https://example.com/x.git");
/// ```
pub fn normalize_constraint(version: &str) -> String {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    match semver::Version::parse(bare) {
        Ok(parsed) => format!("^{}", parsed),
        Err(_) => trimmed.to_string(),
    }
}
