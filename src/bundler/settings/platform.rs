//! Target platforms and their runtime capabilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime capabilities of a target platform.
///
/// They decide which code-generation templates the output stitcher applies:
///
/// - without an `ambient_global`, the shared chunk is bound to the sharing
///   namespace instead of the browser global;
/// - without `links_shared_namespace`, every entry chunk gets a prelude that
///   merges the namespace into the entry's top-level scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// A browser-style global object is available.
    pub ambient_global: bool,
    /// The host runtime already exposes the sharing namespace to entries.
    pub links_shared_namespace: bool,
}

impl PlatformCapabilities {
    /// Capabilities of browser-like platforms.
    pub const CLIENT: Self = Self {
        ambient_global: true,
        links_shared_namespace: true,
    };

    /// Capabilities of the generic server platform (`os`, `server`).
    pub const SERVER: Self = Self {
        ambient_global: false,
        links_shared_namespace: false,
    };

    /// Capabilities of architecture-specific server platforms such as
    /// `os.linux.x86_64`, whose runtime links the namespace into entries.
    pub const SERVER_ARCH: Self = Self {
        ambient_global: false,
        links_shared_namespace: true,
    };
}

const SERVER_FAMILIES: [&str; 2] = ["os", "server"];

/// Target platform tag as handed over by the host build system.
///
/// Examples: `os`, `os.linux.x86_64`, `server`, `web.browser`, `web.cordova`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    /// Wraps a platform tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Server platforms are the `os` and `server` families, with or without
    /// an architecture suffix.
    pub fn is_server(&self) -> bool {
        SERVER_FAMILIES.iter().any(|family| {
            self.0 == *family
                || self
                    .0
                    .strip_prefix(*family)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Capabilities implied by the tag alone.
    ///
    /// Only the bare server tags need the namespace linked into entries.
    pub fn default_capabilities(&self) -> PlatformCapabilities {
        if SERVER_FAMILIES.contains(&self.0.as_str()) {
            PlatformCapabilities::SERVER
        } else if self.is_server() {
            PlatformCapabilities::SERVER_ARCH
        } else {
            PlatformCapabilities::CLIENT
        }
    }

    /// Directory name of this platform's staging root.
    ///
    /// `[A-Za-z0-9._-]` is kept and every other byte is percent-encoded, `%`
    /// included, so the mapping is injective. An empty tag maps to `%` and
    /// dot-only tags have their dots encoded.
    pub fn dir_name(&self) -> String {
        if self.0.is_empty() {
            return "%".to_string();
        }
        let dots_only = self.0.bytes().all(|b| b == b'.');
        let mut name = String::with_capacity(self.0.len());
        for byte in self.0.bytes() {
            let keep = byte.is_ascii_alphanumeric()
                || matches!(byte, b'_' | b'-')
                || (byte == b'.' && !dots_only);
            if keep {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        name
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Platform {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_and_server_families_are_server() {
        for tag in ["os", "os.linux.x86_64", "server", "server.arm64"] {
            assert!(Platform::new(tag).is_server(), "{}", tag);
        }
        for tag in ["web.browser", "osx", "servers", "web.os"] {
            assert!(!Platform::new(tag).is_server(), "{}", tag);
        }
    }

    #[test]
    fn only_bare_server_tags_need_namespace_linking() {
        assert_eq!(Platform::new("os").default_capabilities(), PlatformCapabilities::SERVER);
        assert_eq!(
            Platform::new("server").default_capabilities(),
            PlatformCapabilities::SERVER
        );
        assert_eq!(
            Platform::new("os.osx.x86_64").default_capabilities(),
            PlatformCapabilities::SERVER_ARCH
        );
        assert_eq!(
            Platform::new("web.cordova").default_capabilities(),
            PlatformCapabilities::CLIENT
        );
    }

    #[test]
    fn dir_name_is_filesystem_safe() {
        assert_eq!(Platform::new("web.browser").dir_name(), "web.browser");
        assert_eq!(Platform::new("os/../x").dir_name(), "os%2F..%2Fx");
        assert_eq!(Platform::new("..").dir_name(), "%2E%2E");
        assert_eq!(Platform::new("").dir_name(), "%");
    }

    #[test]
    fn distinct_tags_get_distinct_dirs() {
        let tags = [
            "web/browser",
            "web-browser",
            "web%2Fbrowser",
            "os:x",
            "os-x",
            "os%3Ax",
            ".",
            "%2E",
            "",
            "%",
            "%25",
            "platform-2",
            "web.bröwser",
        ];
        let dirs: std::collections::HashSet<_> =
            tags.iter().map(|tag| Platform::new(*tag).dir_name()).collect();
        assert_eq!(dirs.len(), tags.len());
    }
}
