//! External tool detection.
//!
//! Locates the npm and webpack executables a platform batch runs. Lookups are
//! done per batch because the staging root may carry its own local binary.

use crate::bundler::{
    config::NODE_MODULES_DIR,
    error::{Error, Result},
};
use std::path::{Path, PathBuf};

/// Resolves `tool`.
///
/// Order: an explicitly configured path, `<staging_root>/node_modules/.bin/<tool>`
/// (when a staging root is given), then `PATH`.
pub fn resolve_tool(
    tool: &str,
    explicit: Option<&Path>,
    staging_root: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            log::debug!("Using configured {} at {}", tool, path.display());
            return Ok(path.to_path_buf());
        }
        return Err(Error::ToolNotFound {
            tool: tool.to_string(),
            hint: format!("configured path {} does not exist", path.display()),
        });
    }

    if let Some(root) = staging_root {
        let local = root.join(NODE_MODULES_DIR).join(".bin").join(tool);
        if local.is_file() {
            log::debug!("Found staged {} at {}", tool, local.display());
            return Ok(local);
        }
    }

    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());
            Ok(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            Err(Error::ToolNotFound {
                tool: tool.to_string(),
                hint: format!(
                    "install it or set `program` under [bundler.{}] in the settings file",
                    tool
                ),
            })
        }
    }
}
