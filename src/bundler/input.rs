//! Input files and their classification.
//!
//! The host hands over one [`InputFile`] per source file. [`classify`] derives
//! everything the later stages need in one pass, including the tagged
//! [`FileKind`] that decides how a file is staged and stitched.

use crate::bundler::settings::{PackageIdentity, Platform, Settings, StagingName};

/// One source file handed over by the host build system.
#[derive(Clone, Debug)]
pub struct InputFile {
    package: PackageIdentity,
    file_name: String,
    source: String,
    extension: String,
    platform: Platform,
}

impl InputFile {
    /// Creates an input file; the extension is taken from `file_name`.
    pub fn new(
        package: PackageIdentity,
        file_name: impl Into<String>,
        source: impl Into<String>,
        platform: impl Into<Platform>,
    ) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty() && !stem.ends_with('/'))
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        Self {
            package,
            file_name,
            source: source.into(),
            extension,
            platform: platform.into(),
        }
    }

    /// Overrides the extension reported by the host.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Owning package.
    pub fn package(&self) -> &PackageIdentity {
        &self.package
    }

    /// Package-relative file name (always `/`-separated).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Raw source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Target platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}

/// How a file takes part in a platform batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Entry point: staged, bundled into its own chunk.
    Entry,
    /// The own package's shared-modules placeholder; receives the shared chunk.
    SharedPlaceholder,
    /// Plain JavaScript module; subsumed by the entry that imports it.
    Module,
    /// Anything else.
    Unsupported,
}

/// Everything later stages derive from one input file.
#[derive(Clone, Debug)]
pub struct FileInfo<'a> {
    /// Owning package.
    pub package: &'a PackageIdentity,
    /// Package-relative file name.
    pub file_name: &'a str,
    /// Staging name of the owning package.
    pub staging_name: StagingName,
    /// `<staging name>/<file name>`, relative to `packages/` and `built/`.
    pub staged_path: String,
    /// Raw source text.
    pub source: &'a str,
    /// File extension.
    pub extension: &'a str,
    /// Target platform.
    pub platform: &'a Platform,
    /// Routing decision.
    pub kind: FileKind,
}

impl FileInfo<'_> {
    /// Logical path used in diagnostics: `<package name>/<file name>`.
    pub fn source_path(&self) -> String {
        format!("{}/{}", self.package.name().unwrap_or_default(), self.file_name)
    }
}

/// Classifies one input file.
///
/// Pure and infallible; malformed names simply end up as
/// [`FileKind::Unsupported`] or [`FileKind::Module`].
pub fn classify<'a>(file: &'a InputFile, settings: &Settings) -> FileInfo<'a> {
    let staging_name = file.package.staging_name();
    let staged_path = format!("{}/{}", staging_name, file.file_name);

    let kind = if file.file_name.ends_with(settings.shared_modules_file())
        && &file.package == settings.own_package()
    {
        FileKind::SharedPlaceholder
    } else if file.file_name.ends_with(settings.entry_suffix()) {
        FileKind::Entry
    } else if file.extension == "js" {
        FileKind::Module
    } else {
        FileKind::Unsupported
    };

    FileInfo {
        package: &file.package,
        file_name: &file.file_name,
        staging_name,
        staged_path,
        source: &file.source,
        extension: &file.extension,
        platform: &file.platform,
        kind,
    }
}
