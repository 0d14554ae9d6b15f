//! External tool settings and file routing policy.

use serde::Deserialize;
use std::path::PathBuf;

/// Dependency installer (npm) configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NpmSettings {
    /// Explicit npm executable. Looked up on `PATH` when unset.
    pub program: Option<PathBuf>,

    /// Value passed as `--loglevel`.
    ///
    /// Default: `"silent"`
    pub loglevel: String,

    /// Extra arguments appended to `npm install`.
    pub extra_args: Vec<String>,
}

impl Default for NpmSettings {
    fn default() -> Self {
        Self {
            program: None,
            loglevel: "silent".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Bundling tool (webpack) configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WebpackSettings {
    /// Explicit webpack executable.
    ///
    /// When unset, `node_modules/.bin/webpack` inside the staging root is
    /// preferred, then `PATH`.
    pub program: Option<PathBuf>,

    /// Name of the generated config file inside the staging root.
    ///
    /// Default: `"webpack.config.js"`
    pub config_file: String,
}

impl Default for WebpackSettings {
    fn default() -> Self {
        Self {
            program: None,
            config_file: "webpack.config.js".to_string(),
        }
    }
}

/// What to do with input files that are neither entries, the shared
/// placeholder, nor plain `.js` modules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnclassifiedPolicy {
    /// Emit an empty artifact silently (debug log only).
    Ignore,
    /// Emit an empty artifact and log a warning naming the file.
    #[default]
    Warn,
    /// Fail the platform batch.
    Reject,
}
