#![allow(dead_code)]

use kodegen_bundler_modules::bundler::{
    BundleConfig, BundleTool, DependencyInstaller, Error, ErrorExt, Orchestrator, OutputSink,
    OutputStream, PackageIdentity, Result, Settings, SettingsBuilder,
    invoke::attribute_diagnostics,
    staging::{PackageManifest, TopLevelManifest},
};
use kodegen_bundler_modules::metadata::{PackageRegistry, StaticRegistry};
use std::{
    collections::BTreeMap,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Shared chunk the fake bundler emits; written for a browser global.
pub const SHARED_CHUNK: &str = "(function(modules) {\n\
    var parentJsonpFunction = window[\"webpackJsonp\"];\n\
    window[\"webpackJsonp\"] = function(chunkIds, moreModules) {};\n\
})([]);\n";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn settings(app_root: &Path) -> Settings {
    SettingsBuilder::new()
        .app_root(app_root)
        .build()
        .expect("settings")
}

pub fn package(name: &str) -> PackageIdentity {
    PackageIdentity::parse(name).expect("valid package name")
}

/// Installs every dependency declared by the staged manifests.
///
/// Dependencies declared by more than one package are hoisted to the
/// top-level `node_modules`; the rest are nested under the package.
#[derive(Default)]
pub struct FakeInstaller {
    pub calls: AtomicUsize,
    pub skip_install: bool,
    /// Fails like an npm run that exits with status 1.
    pub fail_install: bool,
}

impl FakeInstaller {
    pub fn skipping() -> Self {
        Self {
            skip_install: true,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_install: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DependencyInstaller for FakeInstaller {
    async fn install(&self, staging_root: &Path, sink: &dyn OutputSink) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let top_path = staging_root.join("package.json");
        let top: TopLevelManifest = serde_json::from_str(
            &std::fs::read_to_string(&top_path).fs_context("reading manifest", &top_path)?,
        )?;
        sink.line("npm", OutputStream::Stdout, "fake install started");
        if self.fail_install {
            return Err(Error::InstallFailed {
                command: "npm install".to_string(),
                status: "exit status: 1".to_string(),
                stderr: vec!["npm ERR! 404 Not Found: lodash@^99.0.0".to_string()],
            });
        }
        if self.skip_install {
            return Ok(());
        }

        let mut manifests = BTreeMap::new();
        for name in top.dependencies.keys() {
            let path = staging_root.join("packages").join(name).join("package.json");
            let manifest: PackageManifest = serde_json::from_str(
                &std::fs::read_to_string(&path).fs_context("reading manifest", &path)?,
            )?;
            manifests.insert(name.clone(), manifest);
        }

        let mut users: BTreeMap<&str, usize> = BTreeMap::new();
        for manifest in manifests.values() {
            for dep in manifest.dependencies.keys() {
                *users.entry(dep.as_str()).or_default() += 1;
            }
        }

        for (name, manifest) in &manifests {
            let package_dir = staging_root.join("node_modules").join(name);
            std::fs::create_dir_all(&package_dir).fs_context("creating", &package_dir)?;
            for (dep, version) in &manifest.dependencies {
                let dir = if users[dep.as_str()] > 1 {
                    staging_root.join("node_modules").join(dep)
                } else {
                    package_dir.join("node_modules").join(dep)
                };
                std::fs::create_dir_all(&dir).fs_context("creating", &dir)?;
                std::fs::write(dir.join("package.json"), format!("{{\"version\":\"{}\"}}", version))
                    .fs_context("writing", &dir)?;
            }
        }
        for tool in top.dev_dependencies.keys() {
            let dir = staging_root.join("node_modules").join(tool);
            std::fs::create_dir_all(&dir).fs_context("creating", &dir)?;
        }
        sink.line("npm", OutputStream::Stderr, "fake install finished");
        Ok(())
    }
}

/// Emits one chunk per entry wrapping the staged source, plus the shared chunk.
#[derive(Default)]
pub struct FakeBundler {
    /// Entries whose staged path contains this text fail to compile.
    pub fail_on: Option<String>,
    pub configs: Mutex<Vec<BundleConfig>>,
}

impl FakeBundler {
    pub fn failing_on(text: &str) -> Self {
        Self {
            fail_on: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn last_config(&self) -> Option<BundleConfig> {
        self.configs.lock().unwrap().last().cloned()
    }
}

impl BundleTool for FakeBundler {
    async fn bundle(
        &self,
        config: &BundleConfig,
        staging_root: &Path,
        sink: &dyn OutputSink,
    ) -> Result<()> {
        self.configs.lock().unwrap().push(config.clone());
        sink.line("webpack", OutputStream::Stdout, "fake bundle");

        if let Some(fail_on) = &self.fail_on {
            let messages: Vec<String> = config
                .entry
                .keys()
                .filter(|staged| staged.contains(fail_on.as_str()))
                .map(|staged| {
                    format!(
                        "ERROR in ./packages/{}\nModule parse failed: Unexpected token (1:7)",
                        staged
                    )
                })
                .collect();
            if !messages.is_empty() {
                return Err(Error::CompileFailed {
                    diagnostics: attribute_diagnostics(messages, config),
                });
            }
        }

        for (name, source) in &config.entry {
            let staged = staging_root.join(source.trim_start_matches("./"));
            let code = std::fs::read_to_string(&staged).fs_context("reading entry", &staged)?;
            let chunk = config.entry_chunk_path(name);
            std::fs::create_dir_all(chunk.parent().unwrap()).fs_context("creating", &chunk)?;
            std::fs::write(
                &chunk,
                format!("webpackJsonp([1], [function(module, exports) {{\n{}\n}}]);\n", code),
            )
            .fs_context("writing chunk", &chunk)?;
        }
        let shared = config.shared_chunk_path();
        std::fs::write(&shared, SHARED_CHUNK).fs_context("writing chunk", &shared)?;
        Ok(())
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator<SharedInstaller, SharedBundler>,
    pub installer: Arc<FakeInstaller>,
    pub bundler: Arc<FakeBundler>,
}

/// Orchestrator over fakes; `installer` and `bundler` stay observable.
pub fn harness(
    settings: Settings,
    registry: StaticRegistry,
    installer: FakeInstaller,
    bundler: FakeBundler,
) -> Harness {
    let installer = Arc::new(installer);
    let bundler = Arc::new(bundler);
    let registry: Arc<dyn PackageRegistry> = Arc::new(registry);
    let orchestrator = Orchestrator::with_tools(
        settings,
        registry,
        SharedInstaller(Arc::clone(&installer)),
        SharedBundler(Arc::clone(&bundler)),
    );
    Harness {
        orchestrator,
        installer,
        bundler,
    }
}

pub struct SharedInstaller(pub Arc<FakeInstaller>);

impl DependencyInstaller for SharedInstaller {
    async fn install(&self, staging_root: &Path, sink: &dyn OutputSink) -> Result<()> {
        self.0.install(staging_root, sink).await
    }
}

pub struct SharedBundler(pub Arc<FakeBundler>);

impl BundleTool for SharedBundler {
    async fn bundle(
        &self,
        config: &BundleConfig,
        staging_root: &Path,
        sink: &dyn OutputSink,
    ) -> Result<()> {
        self.0.bundle(config, staging_root, sink).await
    }
}
