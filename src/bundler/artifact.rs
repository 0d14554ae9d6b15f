//! Build artifacts returned to the host.

/// Output for one input file.
///
/// Entries and the shared placeholder carry bundled code; every other file
/// gets an empty `data` because its code already lives in an entry chunk or
/// the shared chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArtifact {
    /// Output file name (the input's package-relative name).
    pub path: String,
    /// Output JavaScript, possibly empty.
    pub data: String,
    /// Logical `<package>/<file>` path for diagnostics.
    pub source_path: String,
    /// Source map; never produced by this bundler.
    pub source_map: Option<String>,
}

impl BuiltArtifact {
    /// Artifact whose code was folded into another output.
    pub fn empty(path: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: String::new(),
            source_path: source_path.into(),
            source_map: None,
        }
    }

    /// Returns true when the artifact carries no code.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
