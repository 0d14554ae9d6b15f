//! Staging directory management.
//!
//! A staging root is a minimal, self-contained project per platform:
//!
//! ```text
//! <root>/package.json                     top-level manifest
//! <root>/packages/<name>/package.json     per-package manifest
//! <root>/packages/<name>/<entry files>    staged entry sources
//! <root>/node_modules/...                 installed dependencies
//! <root>/built/...                        bundler output
//! ```

mod manifest;

pub use manifest::{
    PackageManifest, STAGED_PACKAGE_VERSION, TopLevelManifest, normalize_constraint,
    to_manifest_json,
};

use crate::bail;
use crate::bundler::{
    config::{BUILT_DIR, BundleConfig, PACKAGES_DIR},
    error::Result,
    input::{FileInfo, FileKind},
    settings::{PackageIdentity, Settings, StagingName, UnclassifiedPolicy},
    utils::fs,
};
use crate::metadata::PackageRegistry;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

/// File name of every manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Result of staging one platform batch.
#[derive(Debug)]
pub struct StagedBatch {
    /// Staging root.
    pub root: PathBuf,
    /// Bundler configuration with every entry registered.
    pub config: BundleConfig,
    /// Top-level manifest as written.
    pub manifest: TopLevelManifest,
    /// Per-package manifests as written.
    pub packages: BTreeMap<StagingName, PackageManifest>,
    /// Every staging name that appeared in the batch.
    pub staging_names: BTreeSet<StagingName>,
}

/// Populates one platform's staging root.
pub struct Stager<'a> {
    settings: &'a Settings,
    registry: &'a dyn PackageRegistry,
    root: PathBuf,
}

impl<'a> Stager<'a> {
    /// Creates a stager for `root`.
    pub fn new(settings: &'a Settings, registry: &'a dyn PackageRegistry, root: PathBuf) -> Self {
        Self {
            settings,
            registry,
            root,
        }
    }

    /// Staging root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the staging root and clears output of previous passes.
    ///
    /// `packages/` and `built/` are always recreated empty. With `reset`, the
    /// whole root (installed dependencies included) is wiped first.
    pub async fn prepare(&self, reset: bool) -> Result<()> {
        if reset {
            log::info!("Resetting staging root {}", self.root.display());
        }
        fs::create_dir_all(&self.root, reset).await?;
        fs::create_dir_all(&self.root.join(PACKAGES_DIR), true).await?;
        fs::create_dir_all(&self.root.join(BUILT_DIR), true).await?;
        Ok(())
    }

    /// Stages every file, writes manifests and returns the partial config.
    pub async fn stage(
        &self,
        files: &[FileInfo<'_>],
        mut config: BundleConfig,
    ) -> Result<StagedBatch> {
        let mut staging_names = BTreeSet::new();
        let mut owners: BTreeMap<StagingName, &PackageIdentity> = BTreeMap::new();
        let packages_dir = self.root.join(PACKAGES_DIR);

        for file in files {
            fs::create_dir_all(&packages_dir.join(file.staging_name.as_str()), false).await?;
            staging_names.insert(file.staging_name.clone());
            owners.insert(file.staging_name.clone(), file.package);

            match file.kind {
                FileKind::Entry => {
                    let target = packages_dir.join(&file.staged_path);
                    fs::write_file(&target, file.source).await?;
                    config.add_entry(&file.staged_path);
                    log::debug!("Staged entry {}", file.staged_path);
                }
                FileKind::SharedPlaceholder => {
                    log::debug!("Skipping shared placeholder {}", file.staged_path);
                }
                FileKind::Module => {
                    log::debug!("{} is subsumed by the entry that imports it", file.staged_path);
                }
                FileKind::Unsupported => match self.settings.unclassified_policy() {
                    UnclassifiedPolicy::Ignore => {
                        log::debug!("Ignoring unsupported file {}", file.source_path());
                    }
                    UnclassifiedPolicy::Warn => {
                        log::warn!(
                            "{} is not a JavaScript module; it produces no output",
                            file.source_path()
                        );
                    }
                    UnclassifiedPolicy::Reject => {
                        bail!(
                            "unsupported input file {} (extension `{}`)",
                            file.source_path(),
                            file.extension
                        );
                    }
                },
            }
        }

        let mut manifest = TopLevelManifest {
            dev_dependencies: self.settings.tool_dependencies().clone(),
            ..Default::default()
        };
        let mut packages = BTreeMap::new();

        for (name, package) in owners {
            if package.is_application() || package == self.settings.own_package() {
                continue;
            }
            let dependencies = self.package_dependencies(package);
            let package_manifest = PackageManifest::new(&name, &dependencies);
            let path = packages_dir.join(name.as_str()).join(MANIFEST_FILE);
            fs::write_file(&path, to_manifest_json(&package_manifest)?).await?;

            manifest.add_local_package(&name);
            packages.insert(name, package_manifest);
        }

        fs::write_file(&self.root.join(MANIFEST_FILE), to_manifest_json(&manifest)?).await?;
        log::debug!(
            "Wrote {} with {} local package(s)",
            self.root.join(MANIFEST_FILE).display(),
            manifest.dependencies.len()
        );

        Ok(StagedBatch {
            root: self.root.clone(),
            config,
            manifest,
            packages,
            staging_names,
        })
    }

    fn package_dependencies(&self, package: &PackageIdentity) -> BTreeMap<String, String> {
        let Some(name) = package.name() else {
            return BTreeMap::new();
        };
        match self.registry.npm_dependencies(name) {
            Some(deps) => deps,
            None => {
                log::debug!("No registry entry for {}; assuming no npm dependencies", name);
                BTreeMap::new()
            }
        }
    }
}
