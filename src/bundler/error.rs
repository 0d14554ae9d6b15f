//! Low-level error types for the bundling pipeline.
//!
//! Every stage of a platform batch reports failures through [`Error`]. The
//! orchestrator tags them with the failing stage before they reach the host
//! (see [`crate::error::BundlerError`]).

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type for bundling stages.
pub type Result<T> = std::result::Result<T, Error>;

/// A single diagnostic reported by the bundling tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileDiagnostic {
    /// Diagnostic text as reported by the tool.
    pub message: String,

    /// Logical source path of the input file the diagnostic refers to, when it
    /// could be attributed to one.
    pub source_path: Option<String>,
}

impl Display for CompileDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => f.write_str(&self.message),
        }
    }
}

fn join_diagnostics(diagnostics: &[CompileDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors raised while staging, installing, bundling or stitching.
#[derive(Debug, Error)]
pub enum Error {
    /// Raw I/O failure without further context.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// File system operation failed on a known path.
    #[error("{context} {}: {source}", path.display())]
    Fs {
        /// What was being done.
        context: &'static str,
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template registration or rendering failure.
    #[error("template error: {0}")]
    Template(String),

    /// Directory traversal failure.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// An external program could not be started or waited on.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Program that was run.
        command: String,
        /// Underlying error.
        error: std::io::Error,
    },

    /// An external program could not be located.
    #[error("`{tool}` not found: {hint}")]
    ToolNotFound {
        /// Program name.
        tool: String,
        /// How to make it available.
        hint: String,
    },

    /// The dependency installer exited unsuccessfully.
    #[error("`{command}` exited with {status}{}", format_stderr(stderr))]
    InstallFailed {
        /// Installer command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Trailing stderr output of the installer.
        stderr: Vec<String>,
    },

    /// Declared dependencies were not materialized by the installer.
    #[error("dependencies missing after install: {}", missing.join(", "))]
    MissingDependencies {
        /// `<staging name> -> <dependency>` pairs that could not be found.
        missing: Vec<String>,
    },

    /// The bundling tool reported compile errors.
    #[error("bundler reported {} error(s):\n{}", diagnostics.len(), join_diagnostics(diagnostics))]
    CompileFailed {
        /// Diagnostics reported by the tool.
        diagnostics: Vec<CompileDiagnostic>,
    },

    /// A package name does not follow the package naming rules.
    #[error("invalid package name `{name}`: {reason}")]
    InvalidPackageName {
        /// Offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

fn format_stderr(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        format!(":\n{}", lines.join("\n"))
    }
}

/// Attaches path context to I/O results.
pub trait ErrorExt<T> {
    /// Converts an I/O error into [`Error::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Adds a message to a missing value or a foreign error.
pub trait Context<T> {
    /// Turns `None` or an error into [`Error::GenericError`] carrying `msg`.
    fn context<C: Display>(self, msg: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {}", msg, e)))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_context_names_operation_and_path() {
        let err: Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ))
        .fs_context("writing manifest", "/tmp/stage/package.json");
        let text = err.unwrap_err().to_string();
        assert_eq!(text, "writing manifest /tmp/stage/package.json: denied");
    }

    #[test]
    fn compile_failure_lists_attributed_diagnostics() {
        let err = Error::CompileFailed {
            diagnostics: vec![
                CompileDiagnostic {
                    message: "Unexpected token".into(),
                    source_path: Some("acme:widgets/module.js".into()),
                },
                CompileDiagnostic {
                    message: "Module not found".into(),
                    source_path: None,
                },
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("bundler reported 2 error(s)"));
        assert!(text.contains("acme:widgets/module.js: Unexpected token"));
        assert!(text.contains("\nModule not found"));
    }

    #[test]
    fn option_context_becomes_generic_error() {
        let missing: Option<u8> = None;
        let err = missing.context("no platform").unwrap_err();
        assert!(matches!(err, Error::GenericError(ref m) if m == "no platform"));
    }
}
