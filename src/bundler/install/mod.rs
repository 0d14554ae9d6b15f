//! Third-party dependency installation.
//!
//! Installation of a staging root happens in two sequential steps: the
//! top-level manifest is loaded and the installer located, then the install
//! itself runs with the staging root as its working directory. Tool output
//! goes to an [`OutputSink`] chosen by the caller.

mod sink;

pub use sink::{CaptureSink, LogSink, NullSink, OutputSink, OutputStream};

use crate::bundler::{
    builder::tool_detection::resolve_tool,
    config::{NODE_MODULES_DIR, PACKAGES_DIR},
    error::{Error, Result},
    settings::{NpmSettings, StagingName},
    staging::{MANIFEST_FILE, PackageManifest, TopLevelManifest},
    utils::{fs, process::run_streamed},
};
use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
};
use tokio::process::Command;

/// Materializes the dependencies declared in a staging root.
pub trait DependencyInstaller: Send + Sync {
    /// Installs everything `<staging_root>/package.json` declares, transitively.
    ///
    /// Resolves once installation has finished; a failure of the underlying
    /// tool is an error.
    fn install(
        &self,
        staging_root: &Path,
        sink: &dyn OutputSink,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Installs with `npm install`.
#[derive(Debug, Clone, Default)]
pub struct NpmInstaller {
    settings: NpmSettings,
}

/// Loaded install context of one staging root.
#[derive(Debug)]
struct InstallContext {
    manifest: TopLevelManifest,
    program: PathBuf,
}

impl NpmInstaller {
    /// Creates an installer.
    pub fn new(settings: NpmSettings) -> Self {
        Self { settings }
    }

    fn load_context(&self, manifest_json: &str) -> Result<InstallContext> {
        let manifest: TopLevelManifest = serde_json::from_str(manifest_json)?;
        let program = resolve_tool("npm", self.settings.program.as_deref(), None)?;
        Ok(InstallContext { manifest, program })
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            "--no-audit".to_string(),
            "--no-fund".to_string(),
            format!("--loglevel={}", self.settings.loglevel),
        ];
        args.extend(self.settings.extra_args.iter().cloned());
        args
    }
}

impl DependencyInstaller for NpmInstaller {
    async fn install(&self, staging_root: &Path, sink: &dyn OutputSink) -> Result<()> {
        let manifest_json = fs::read_to_string(&staging_root.join(MANIFEST_FILE)).await?;
        let context = self.load_context(&manifest_json)?;
        log::debug!(
            "Installing {} local package(s) and {} tool dependency(ies) in {}",
            context.manifest.dependencies.len(),
            context.manifest.dev_dependencies.len(),
            staging_root.display()
        );

        let args = self.args();
        let command_line = format!("npm {}", args.join(" "));
        let mut command = Command::new(&context.program);
        command.args(&args).current_dir(staging_root);

        let output = run_streamed(command, "npm", sink, false).await?;
        if !output.status.success() {
            return Err(Error::InstallFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr: output.stderr_tail,
            });
        }
        Ok(())
    }
}

/// Checks that every dependency of every staged package was installed.
///
/// A dependency counts as present under
/// `node_modules/<s>/node_modules/<dep>`, `packages/<s>/node_modules/<dep>`
/// or hoisted to `node_modules/<dep>`.
pub fn verify_closure(
    staging_root: &Path,
    packages: &BTreeMap<StagingName, PackageManifest>,
) -> Result<()> {
    let node_modules = staging_root.join(NODE_MODULES_DIR);
    let mut missing = Vec::new();

    for (name, manifest) in packages {
        for dep in manifest.dependencies.keys() {
            let candidates = [
                node_modules
                    .join(name.as_str())
                    .join(NODE_MODULES_DIR)
                    .join(dep),
                staging_root
                    .join(PACKAGES_DIR)
                    .join(name.as_str())
                    .join(NODE_MODULES_DIR)
                    .join(dep),
                node_modules.join(dep),
            ];
            if !candidates.iter().any(|path| path.is_dir()) {
                missing.push(format!("{} -> {}", name, dep));
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingDependencies { missing })
    }
}
