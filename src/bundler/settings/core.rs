//! Core Settings struct and implementations.

use super::{
    NpmSettings, PackageIdentity, Platform, PlatformCapabilities, UnclassifiedPolicy,
    WebpackSettings,
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Main settings for the module bundler.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder) or loaded from a
/// TOML file with [`crate::metadata::load_settings`].
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_modules::bundler::SettingsBuilder;
///
/// # fn example() -> kodegen_bundler_modules::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app_root("/srv/my-app")
///     .namespace("RocketModule")
///     .build()?;
/// assert!(settings.staging_base().ends_with(".meteor/local/module-bundler"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Root of the application being built.
    app_root: PathBuf,

    /// Directory holding one staging root per platform.
    staging_base: PathBuf,

    /// Package that hosts this bundler and exports the sharing namespace.
    own_package: PackageIdentity,

    /// Identifier of the sharing namespace.
    namespace: String,

    /// File-name suffix that marks an entry point.
    entry_suffix: String,

    /// File name of the shared-exports placeholder and of the shared chunk.
    shared_modules_file: String,

    /// Browser global that bundler output attaches shared code to.
    browser_global: String,

    /// Tooling packages installed into every staging root as devDependencies.
    tool_dependencies: BTreeMap<String, String>,

    npm: NpmSettings,

    webpack: WebpackSettings,

    unclassified: UnclassifiedPolicy,

    /// Wipe a platform's whole staging root (installed dependencies included)
    /// the first time that platform is processed in this process.
    reset_on_first_run: bool,

    /// Capability overrides keyed by platform tag.
    platform_overrides: BTreeMap<String, PlatformCapabilities>,
}

impl Settings {
    /// Returns the application root.
    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    /// Returns the directory holding all staging roots.
    pub fn staging_base(&self) -> &Path {
        &self.staging_base
    }

    /// Staging root for one platform.
    ///
    /// Distinct platforms always map to distinct directories.
    pub fn staging_root(&self, platform: &Platform) -> PathBuf {
        self.staging_base.join(platform.dir_name())
    }

    /// Returns the bundler's own package.
    pub fn own_package(&self) -> &PackageIdentity {
        &self.own_package
    }

    /// Returns the sharing namespace identifier.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the entry-point file-name suffix.
    pub fn entry_suffix(&self) -> &str {
        &self.entry_suffix
    }

    /// Returns the shared-modules file name.
    pub fn shared_modules_file(&self) -> &str {
        &self.shared_modules_file
    }

    /// Returns the browser global identifier.
    pub fn browser_global(&self) -> &str {
        &self.browser_global
    }

    /// Returns the tooling devDependencies.
    pub fn tool_dependencies(&self) -> &BTreeMap<String, String> {
        &self.tool_dependencies
    }

    /// Returns the npm settings.
    pub fn npm(&self) -> &NpmSettings {
        &self.npm
    }

    /// Returns the webpack settings.
    pub fn webpack(&self) -> &WebpackSettings {
        &self.webpack
    }

    /// Returns the policy for unclassified files.
    pub fn unclassified_policy(&self) -> UnclassifiedPolicy {
        self.unclassified
    }

    /// Whether first-run passes wipe the staging root.
    pub fn reset_on_first_run(&self) -> bool {
        self.reset_on_first_run
    }

    /// Capabilities of a platform, honoring overrides.
    pub fn capabilities(&self, platform: &Platform) -> PlatformCapabilities {
        self.platform_overrides
            .get(platform.as_str())
            .copied()
            .unwrap_or_else(|| platform.default_capabilities())
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        app_root: PathBuf,
        staging_base: PathBuf,
        own_package: PackageIdentity,
        namespace: String,
        entry_suffix: String,
        shared_modules_file: String,
        browser_global: String,
        tool_dependencies: BTreeMap<String, String>,
        npm: NpmSettings,
        webpack: WebpackSettings,
        unclassified: UnclassifiedPolicy,
        reset_on_first_run: bool,
        platform_overrides: BTreeMap<String, PlatformCapabilities>,
    ) -> Self {
        Self {
            app_root,
            staging_base,
            own_package,
            namespace,
            entry_suffix,
            shared_modules_file,
            browser_global,
            tool_dependencies,
            npm,
            webpack,
            unclassified,
            reset_on_first_run,
            platform_overrides,
        }
    }
}
