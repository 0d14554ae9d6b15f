//! Running the bundling tool.
//!
//! A [`BundleTool`] turns a finalized [`BundleConfig`] into chunks under
//! `<staging root>/built`. The tool runs as a child process whose working
//! directory is the staging root; the orchestrator's own working directory is
//! never touched.

mod webpack;

pub use webpack::{WebpackCli, parse_stats, render_config};

use crate::bundler::{
    config::{BUILT_DIR, BundleConfig, PACKAGES_DIR},
    error::{CompileDiagnostic, Error, Result},
    install::OutputSink,
    settings::StagingName,
};
use std::{future::Future, path::Path};
use walkdir::WalkDir;

/// Compiles the registered entries of a staging root.
pub trait BundleTool: Send + Sync {
    /// Runs the tool to completion.
    ///
    /// Compile errors are reported as [`Error::CompileFailed`].
    fn bundle(
        &self,
        config: &BundleConfig,
        staging_root: &Path,
        sink: &dyn OutputSink,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Turns raw tool messages into diagnostics, attributing each to the entry
/// whose staged path it mentions.
pub fn attribute_diagnostics(
    messages: impl IntoIterator<Item = String>,
    config: &BundleConfig,
) -> Vec<CompileDiagnostic> {
    messages
        .into_iter()
        .map(|message| {
            let source_path = config
                .entry
                .keys()
                .find(|staged| message.contains(&format!("{}/{}", PACKAGES_DIR, staged)))
                .and_then(|staged| logical_source_path(staged));
            CompileDiagnostic {
                message,
                source_path,
            }
        })
        .collect()
}

/// Maps `<staging name>/<file>` back to `<package name>/<file>`.
fn logical_source_path(staged: &str) -> Option<String> {
    let (staging, file) = staged.split_once('/')?;
    let identity = StagingName::parse(staging).and_then(|s| s.to_identity()).ok()?;
    Some(format!("{}/{}", identity.name().unwrap_or_default(), file))
}

/// Checks that the shared chunk and every entry chunk were emitted.
///
/// A missing chunk is reported as a compile failure listing what `built/`
/// does contain.
pub async fn verify_outputs(config: &BundleConfig) -> Result<()> {
    let mut expected = vec![config.shared_chunk_path()];
    expected.extend(config.entry.keys().map(|staged| config.entry_chunk_path(staged)));

    let mut missing = Vec::new();
    for path in expected {
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            missing.push(path);
        }
    }
    if missing.is_empty() {
        return Ok(());
    }

    let emitted = list_built(&config.output.path)?;
    let diagnostics = missing
        .into_iter()
        .map(|path| CompileDiagnostic {
            message: format!(
                "expected chunk {} was not emitted (built/ contains: {})",
                path.display(),
                if emitted.is_empty() {
                    "nothing".to_string()
                } else {
                    emitted.join(", ")
                }
            ),
            source_path: None,
        })
        .collect();
    Err(Error::CompileFailed { diagnostics })
}

fn list_built(built: &Path) -> Result<Vec<String>> {
    if !built.is_dir() {
        log::debug!("{} does not exist", BUILT_DIR);
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(built).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(built) {
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(files)
}
