//! Platform batch orchestration.
//!
//! This module provides the [`Orchestrator`] that drives one platform batch
//! through staging, dependency installation, bundling and stitching.

use super::context::BuildContext;
use crate::{
    bundler::{
        self,
        artifact::BuiltArtifact,
        config::BundleConfig,
        input::{InputFile, classify},
        install::{DependencyInstaller, NpmInstaller, NullSink, OutputSink, verify_closure},
        invoke::{BundleTool, WebpackCli},
        settings::{PackageIdentity, Platform, Settings},
        staging::Stager,
        stitch::Stitcher,
    },
    error::{BundlerError, Result, Stage},
    metadata::PackageRegistry,
};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Drives platform batches.
///
/// Cloning is cheap; every clone shares settings, registry, tools, output
/// sink and build context.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_modules::bundler::{
///     InputFile, Orchestrator, PackageIdentity, SettingsBuilder,
/// };
/// use kodegen_bundler_modules::metadata::StaticRegistry;
///
/// # async fn example() -> kodegen_bundler_modules::error::Result<()> {
/// let settings = SettingsBuilder::new().app_root("/srv/my-app").build()?;
/// let registry = StaticRegistry::new().with_installed("rocket:module");
/// let orchestrator = Orchestrator::new(settings, registry);
///
/// let files = vec![InputFile::new(
///     PackageIdentity::parse("acme:widgets")?,
///     "module.js",
///     "export default 1",
///     "os",
/// )];
/// let artifacts = orchestrator.process_files_for_target(&files).await?;
/// assert_eq!(artifacts.len(), files.len());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<I = NpmInstaller, B = WebpackCli> {
    settings: Arc<Settings>,
    registry: Arc<dyn PackageRegistry>,
    installer: Arc<I>,
    tool: Arc<B>,
    sink: Arc<dyn OutputSink>,
    context: Arc<BuildContext>,
}

impl<I, B> Clone for Orchestrator<I, B> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            registry: Arc::clone(&self.registry),
            installer: Arc::clone(&self.installer),
            tool: Arc::clone(&self.tool),
            sink: Arc::clone(&self.sink),
            context: Arc::clone(&self.context),
        }
    }
}

impl<I, B> std::fmt::Debug for Orchestrator<I, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator that installs with npm and bundles with webpack.
    ///
    /// Tool output is discarded; see [`Orchestrator::with_sink`].
    pub fn new(settings: Settings, registry: impl PackageRegistry + 'static) -> Self {
        let installer = NpmInstaller::new(settings.npm().clone());
        let tool = WebpackCli::new(settings.webpack().clone());
        Self::with_tools(settings, Arc::new(registry), installer, tool)
    }
}

impl<I, B> Orchestrator<I, B>
where
    I: DependencyInstaller,
    B: BundleTool,
{
    /// Creates an orchestrator with explicit installer and bundling tool.
    pub fn with_tools(
        settings: Settings,
        registry: Arc<dyn PackageRegistry>,
        installer: I,
        tool: B,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            registry,
            installer: Arc::new(installer),
            tool: Arc::new(tool),
            sink: Arc::new(NullSink),
            context: Arc::new(BuildContext::new()),
        }
    }

    /// Sends installer and bundler output to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Shares a build context owned by the host.
    pub fn with_context(mut self, context: Arc<BuildContext>) -> Self {
        self.context = context;
        self
    }

    /// Returns a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Compiles one platform batch.
    ///
    /// Returns exactly one artifact per input file, in input order. Any
    /// failure aborts the batch and is tagged with the stage that failed; no
    /// artifacts are returned in that case.
    pub async fn process_files_for_target(&self, files: &[InputFile]) -> Result<Vec<BuiltArtifact>> {
        let platform = batch_platform(files)?;
        let settings = self.settings.as_ref();
        let capabilities = settings.capabilities(&platform);
        let stage = |stage: Stage| {
            let platform = platform.clone();
            move |source: bundler::Error| BundlerError::stage(stage, platform, source)
        };

        log::info!("Processing {} file(s) for platform {}", files.len(), platform);
        self.check_own_package();

        let infos: Vec<_> = files.iter().map(|file| classify(file, settings)).collect();

        let stager = Stager::new(
            settings,
            self.registry.as_ref(),
            settings.staging_root(&platform),
        );
        let root = stager.root();
        let reset = self.context.begin_pass(&platform) && settings.reset_on_first_run();
        stager.prepare(reset).await.map_err(stage(Stage::Staging))?;

        let global_object =
            (!capabilities.ambient_global).then(|| settings.namespace().to_string());
        let config = BundleConfig::new(root, settings.shared_modules_file(), global_object);
        let staged = stager
            .stage(&infos, config)
            .await
            .map_err(stage(Stage::Staging))?;
        log::info!(
            "Staged {} entry(ies) from {} package(s) in {}",
            staged.config.entry.len(),
            staged.staging_names.len(),
            root.display()
        );

        let mut config = staged.config;
        if config.entry.is_empty() {
            log::info!("No entry points for platform {}; skipping install and bundling", platform);
        } else {
            log::info!("Installing dependencies for platform {}", platform);
            self.installer
                .install(root, self.sink.as_ref())
                .await
                .map_err(stage(Stage::DependencyInstall))?;
            verify_closure(root, &staged.packages).map_err(stage(Stage::DependencyInstall))?;

            config
                .finalize(root, &staged.staging_names)
                .await
                .map_err(stage(Stage::Bundling))?;

            log::info!("Bundling platform {}", platform);
            self.tool
                .bundle(&config, root, self.sink.as_ref())
                .await
                .map_err(stage(Stage::Bundling))?;
        }

        let stitcher = Stitcher::new(settings, capabilities).map_err(stage(Stage::Stitching))?;
        let artifacts = stitcher
            .stitch(&infos, &config)
            .await
            .map_err(stage(Stage::Stitching))?;

        log::info!(
            "Platform {} produced {} artifact(s), {} with code",
            platform,
            artifacts.len(),
            artifacts.iter().filter(|a| !a.is_empty()).count()
        );
        Ok(artifacts)
    }

    /// Blocking form of [`Orchestrator::process_files_for_target`].
    ///
    /// Runs the batch on a private current-thread runtime. Must not be called
    /// from inside an async runtime.
    pub fn process_files_for_target_blocking(&self, files: &[InputFile]) -> Result<Vec<BuiltArtifact>> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(BundlerError::Bundler(bundler::Error::GenericError(
                "process_files_for_target_blocking called from within an async runtime".into(),
            )));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(bundler::Error::from)?;
        runtime.block_on(self.process_files_for_target(files))
    }

    /// Compiles several platform batches concurrently.
    ///
    /// Each batch runs as its own task; results come back in the order the
    /// batches were given. A failing batch does not affect the others.
    pub async fn process_platforms(
        &self,
        batches: Vec<Vec<InputFile>>,
    ) -> Vec<Result<Vec<BuiltArtifact>>>
    where
        I: 'static,
        B: 'static,
    {
        let mut tasks = JoinSet::new();
        let count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let this = self.clone();
            tasks.spawn(async move { (index, this.process_files_for_target(&batch).await) });
        }

        let mut results: Vec<Option<Result<Vec<BuiltArtifact>>>> =
            std::iter::repeat_with(|| None).take(count).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => log::error!("Platform batch task failed: {}", e),
            }
        }

        results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|| {
                    Err(BundlerError::Anyhow(anyhow::anyhow!(
                        "platform batch task panicked or was cancelled"
                    )))
                })
            })
            .collect()
    }

    fn check_own_package(&self) {
        if let PackageIdentity::Package(name) = self.settings.own_package() {
            if !self.registry.is_installed(name) {
                log::warn!(
                    "{} is not installed in the application; shared modules will not be reachable",
                    name
                );
            }
        }
    }
}

/// Platform shared by every file of a batch.
fn batch_platform(files: &[InputFile]) -> Result<Platform> {
    let Some(first) = files.first() else {
        return Err(BundlerError::stage(
            Stage::Staging,
            "<none>",
            bundler::Error::GenericError("empty input batch".into()),
        ));
    };
    let platform = first.platform();
    if let Some(other) = files.iter().find(|file| file.platform() != platform) {
        return Err(BundlerError::stage(
            Stage::Staging,
            platform,
            bundler::Error::GenericError(format!(
                "batch mixes platforms `{}` and `{}`",
                platform,
                other.platform()
            )),
        ));
    }
    Ok(platform.clone())
}
