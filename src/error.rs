//! Error types surfaced to the host build system.
//!
//! Every failure of a platform batch names the stage that failed and the
//! platform it belongs to, wrapping the underlying [`bundler::Error`].

use crate::bundler::{self, CompileDiagnostic};
use std::fmt;
use thiserror::Error;

/// Result type alias for host-facing operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Pipeline stage of a platform batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Building the staging tree (StagingFailure).
    Staging,
    /// Installing third-party dependencies (DependencyResolutionFailure).
    DependencyInstall,
    /// Running the bundling tool (BundleCompileFailure).
    Bundling,
    /// Reading chunks back into artifacts.
    Stitching,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Staging => "staging",
            Self::DependencyInstall => "dependency installation",
            Self::Bundling => "bundling",
            Self::Stitching => "output stitching",
        })
    }
}

/// Main error type for host-facing operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// A stage of a platform batch failed; the batch produced no artifacts.
    #[error("{stage} failed for platform `{platform}`: {source}")]
    Stage {
        /// Failing stage.
        stage: Stage,
        /// Platform tag of the batch.
        platform: String,
        /// Underlying failure.
        #[source]
        source: bundler::Error,
    },

    /// Settings or registry could not be loaded.
    #[error("Configuration error: {reason}")]
    Config {
        /// Reason for the error
        reason: String,
    },

    /// Bundler errors outside a platform batch
    #[error("Bundler error: {0}")]
    Bundler(#[from] bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl BundlerError {
    /// Wraps a stage failure.
    pub fn stage(stage: Stage, platform: impl fmt::Display, source: bundler::Error) -> Self {
        Self::Stage {
            stage,
            platform: platform.to_string(),
            source,
        }
    }

    /// Stage that failed, if the error came from a platform batch.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Compile diagnostics reported by the bundling tool, if any.
    pub fn diagnostics(&self) -> &[CompileDiagnostic] {
        match self {
            Self::Stage {
                source: bundler::Error::CompileFailed { diagnostics },
                ..
            }
            | Self::Bundler(bundler::Error::CompileFailed { diagnostics }) => diagnostics.as_slice(),
            _ => &[],
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self.failed_stage() {
            Some(Stage::Staging) => vec![
                "Check that the staging directory is writable and the disk is not full".to_string(),
            ],
            Some(Stage::DependencyInstall) => vec![
                "Check the npm output above and the versions declared by each package".to_string(),
                "Remove the staging root to force a clean install".to_string(),
            ],
            Some(Stage::Bundling) => vec![
                "Fix the reported compile errors in the listed entry files".to_string(),
            ],
            Some(Stage::Stitching) => vec![
                "The bundler did not emit the expected chunks; check its configuration".to_string(),
            ],
            None => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_name_stage_and_platform() {
        let err = BundlerError::stage(
            Stage::DependencyInstall,
            "os",
            bundler::Error::GenericError("boom".into()),
        );
        assert_eq!(
            err.to_string(),
            "dependency installation failed for platform `os`: boom"
        );
        assert_eq!(err.failed_stage(), Some(Stage::DependencyInstall));
        assert!(err.diagnostics().is_empty());
    }

    #[test]
    fn compile_diagnostics_are_reachable() {
        let err = BundlerError::stage(
            Stage::Bundling,
            "web.browser",
            bundler::Error::CompileFailed {
                diagnostics: vec![CompileDiagnostic {
                    message: "Unexpected token".into(),
                    source_path: None,
                }],
            },
        );
        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.recovery_suggestions().len(), 1);
    }
}
