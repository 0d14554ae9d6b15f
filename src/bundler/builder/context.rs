//! State that lives for one build process.

use crate::bundler::settings::Platform;
use std::{collections::HashSet, sync::Mutex};

/// Tracks which platforms have already been processed by this build process.
///
/// Owned by the host and handed to the orchestrator; two orchestrators sharing
/// a context agree on what "first run" means.
#[derive(Debug, Default)]
pub struct BuildContext {
    seen: Mutex<HashSet<String>>,
}

impl BuildContext {
    /// Creates a context in which no platform has run yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pass for `platform` and returns true if it is the first one.
    pub fn begin_pass(&self, platform: &Platform) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.insert(platform.as_str().to_string())
    }
}
