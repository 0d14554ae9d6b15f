//! Bundler configuration assembled during a platform batch.
//!
//! Entries are registered while files are staged; resolution fallbacks are
//! appended by [`BundleConfig::finalize`] once dependencies are installed.

use crate::bundler::{error::Result, settings::StagingName, utils::fs};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Directory (inside the staging root) the bundler writes chunks to.
pub const BUILT_DIR: &str = "built";

/// Directory (inside the staging root) holding staged package sources.
pub const PACKAGES_DIR: &str = "packages";

/// Directory (inside the staging root) holding installed dependencies.
pub const NODE_MODULES_DIR: &str = "node_modules";

/// Bundler configuration for one staging root.
#[derive(Debug, Clone, Serialize)]
pub struct BundleConfig {
    /// Chunk name (`<staging name>/<file>`) -> staging-relative source path.
    pub entry: BTreeMap<String, String>,
    /// Where and how chunks are written.
    pub output: OutputConfig,
    /// Module resolution settings.
    pub resolve: ResolveConfig,
    /// File name of the extracted shared chunk.
    #[serde(skip)]
    pub shared_chunk: String,
}

/// Output section of [`BundleConfig`].
#[derive(Debug, Clone, Serialize)]
pub struct OutputConfig {
    /// Absolute output directory.
    pub path: PathBuf,
    /// Chunk file-name pattern.
    pub filename: String,
    /// Object the runtime attaches shared code to, when not the browser global.
    #[serde(rename = "globalObject", skip_serializing_if = "Option::is_none")]
    pub global_object: Option<String>,
}

/// Resolve section of [`BundleConfig`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveConfig {
    /// Fallback directories searched for modules, in order, without duplicates.
    pub fallback: Vec<PathBuf>,
}

impl BundleConfig {
    /// Starts an empty configuration writing into `<staging_root>/built`.
    pub fn new(
        staging_root: &Path,
        shared_chunk: impl Into<String>,
        global_object: Option<String>,
    ) -> Self {
        Self {
            entry: BTreeMap::new(),
            output: OutputConfig {
                path: staging_root.join(BUILT_DIR),
                filename: "[name]".to_string(),
                global_object,
            },
            resolve: ResolveConfig::default(),
            shared_chunk: shared_chunk.into(),
        }
    }

    /// Registers an entry by its `<staging name>/<file>` path.
    pub fn add_entry(&mut self, staged_path: &str) {
        self.entry.insert(
            staged_path.to_string(),
            format!("./{}/{}", PACKAGES_DIR, staged_path),
        );
    }

    /// Appends a resolution fallback unless already present.
    pub fn add_fallback(&mut self, path: PathBuf) {
        if !self.resolve.fallback.contains(&path) {
            self.resolve.fallback.push(path);
        }
    }

    /// Adds `node_modules/<name>/node_modules` for every staged package whose
    /// installed dependency tree exists and is non-empty.
    ///
    /// Packages without third-party dependencies contribute nothing.
    pub async fn finalize<'a>(
        &mut self,
        staging_root: &Path,
        names: impl IntoIterator<Item = &'a StagingName>,
    ) -> Result<()> {
        for name in names {
            let tree = staging_root
                .join(NODE_MODULES_DIR)
                .join(name.as_str())
                .join(NODE_MODULES_DIR);
            if fs::dir_has_entries(&tree).await? {
                log::debug!("Adding resolution fallback {}", tree.display());
                self.add_fallback(tree);
            }
        }
        Ok(())
    }

    /// Path of the emitted chunk for an entry.
    pub fn entry_chunk_path(&self, staged_path: &str) -> PathBuf {
        self.output.path.join(staged_path)
    }

    /// Path of the emitted shared chunk.
    pub fn shared_chunk_path(&self) -> PathBuf {
        self.output.path.join(&self.shared_chunk)
    }
}
