//! Builder for constructing Settings.

use super::{
    NpmSettings, PackageIdentity, PlatformCapabilities, Settings, UnclassifiedPolicy,
    WebpackSettings,
};
use crate::{
    bail,
    bundler::error::{Context, ErrorExt},
};
use path_absolutize::Absolutize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Package that ships the bundler and its shared-modules placeholder.
pub const DEFAULT_OWN_PACKAGE: &str = "rocket:module";

/// Default sharing namespace exported by the own package.
pub const DEFAULT_NAMESPACE: &str = "RocketModule";

/// Staging base relative to the application root.
pub const DEFAULT_STAGING_DIR: &str = ".meteor/local/module-bundler";

/// Builder for constructing [`Settings`].
///
/// Every field except the application root has a default matching a stock
/// host setup.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_modules::bundler::{SettingsBuilder, UnclassifiedPolicy};
///
/// # fn example() -> kodegen_bundler_modules::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app_root("/srv/my-app")
///     .staging_base("/tmp/module-staging")
///     .unclassified_policy(UnclassifiedPolicy::Reject)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    app_root: Option<PathBuf>,
    staging_base: Option<PathBuf>,
    own_package: Option<PackageIdentity>,
    namespace: Option<String>,
    entry_suffix: Option<String>,
    shared_modules_file: Option<String>,
    browser_global: Option<String>,
    tool_dependencies: Option<BTreeMap<String, String>>,
    npm: NpmSettings,
    webpack: WebpackSettings,
    unclassified: UnclassifiedPolicy,
    reset_on_first_run: bool,
    platform_overrides: BTreeMap<String, PlatformCapabilities>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the application root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn app_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the directory that holds per-platform staging roots.
    ///
    /// Default: `<app_root>/.meteor/local/module-bundler`
    pub fn staging_base<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.staging_base = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the package that hosts the bundler.
    ///
    /// Default: `rocket:module`
    pub fn own_package(mut self, package: PackageIdentity) -> Self {
        self.own_package = Some(package);
        self
    }

    /// Sets the sharing namespace identifier.
    ///
    /// Default: `RocketModule`
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the entry-point file-name suffix.
    ///
    /// Default: `module.js`
    pub fn entry_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.entry_suffix = Some(suffix.into());
        self
    }

    /// Sets the shared-modules placeholder and chunk file name.
    ///
    /// Default: `shared-modules.js`
    pub fn shared_modules_file(mut self, name: impl Into<String>) -> Self {
        self.shared_modules_file = Some(name.into());
        self
    }

    /// Sets the browser global identifier bundler output refers to.
    ///
    /// Default: `window`
    pub fn browser_global(mut self, global: impl Into<String>) -> Self {
        self.browser_global = Some(global.into());
        self
    }

    /// Replaces the tooling devDependencies of every staging root.
    ///
    /// Default: `{ "webpack": "^1.9.10" }`
    pub fn tool_dependencies(mut self, deps: BTreeMap<String, String>) -> Self {
        self.tool_dependencies = Some(deps);
        self
    }

    /// Sets npm settings.
    pub fn npm(mut self, npm: NpmSettings) -> Self {
        self.npm = npm;
        self
    }

    /// Sets webpack settings.
    pub fn webpack(mut self, webpack: WebpackSettings) -> Self {
        self.webpack = webpack;
        self
    }

    /// Sets the policy for unclassified input files.
    ///
    /// Default: [`UnclassifiedPolicy::Warn`]
    pub fn unclassified_policy(mut self, policy: UnclassifiedPolicy) -> Self {
        self.unclassified = policy;
        self
    }

    /// Wipes each staging root the first time its platform is processed.
    ///
    /// Default: false
    pub fn reset_on_first_run(mut self, reset: bool) -> Self {
        self.reset_on_first_run = reset;
        self
    }

    /// Overrides the capabilities of one platform tag.
    pub fn platform_capabilities(
        mut self,
        tag: impl Into<String>,
        capabilities: PlatformCapabilities,
    ) -> Self {
        self.platform_overrides.insert(tag.into(), capabilities);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `app_root` is missing, if the namespace or browser
    /// global are not valid identifiers, or if the staging base cannot be made
    /// absolute.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        let app_root = self.app_root.context("app_root is required")?;

        let staging_base = self
            .staging_base
            .unwrap_or_else(|| app_root.join(DEFAULT_STAGING_DIR));
        let staging_base = staging_base
            .absolutize()
            .fs_context("resolving staging base", &staging_base)?
            .into_owned();

        let namespace = self
            .namespace
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let browser_global = self.browser_global.unwrap_or_else(|| "window".to_string());
        for ident in [&namespace, &browser_global] {
            if !is_identifier(ident) {
                bail!("`{}` is not a valid JavaScript identifier", ident);
            }
        }

        if browser_global.contains('$') {
            bail!("browser global `{}` must be a plain word identifier", browser_global);
        }
        if namespace == browser_global {
            bail!("namespace must differ from the browser global");
        }

        let entry_suffix = self.entry_suffix.unwrap_or_else(|| "module.js".to_string());
        let shared_modules_file = self
            .shared_modules_file
            .unwrap_or_else(|| "shared-modules.js".to_string());
        if entry_suffix.is_empty() || shared_modules_file.is_empty() {
            bail!("entry suffix and shared modules file must not be empty");
        }

        let tool_dependencies = self.tool_dependencies.unwrap_or_else(|| {
            BTreeMap::from([("webpack".to_string(), "^1.9.10".to_string())])
        });

        Ok(Settings::new(
            app_root,
            staging_base,
            self.own_package
                .unwrap_or_else(|| PackageIdentity::Package(DEFAULT_OWN_PACKAGE.to_string())),
            namespace,
            entry_suffix,
            shared_modules_file,
            browser_global,
            tool_dependencies,
            self.npm,
            self.webpack,
            self.unclassified,
            self.reset_on_first_run,
            self.platform_overrides,
        ))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
