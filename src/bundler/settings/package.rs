//! Package identities and their staging names.

use crate::bundler::error::{Error, Result};
use std::fmt;

/// Staging name used for files owned by the application itself.
pub const APP_STAGING_NAME: &str = "__app__";

/// Identity of the source package that owns an input file.
///
/// Package names follow the host registry rules: lowercase ASCII letters,
/// digits, `.` and `-`, optionally prefixed by an author and a single `:`
/// (e.g. `acme:widgets`). Names are validated by [`PackageIdentity::parse`].
///
/// # Examples
///
/// ```
/// use kodegen_bundler_modules::bundler::PackageIdentity;
///
/// let id = PackageIdentity::parse("acme:widgets").unwrap();
/// assert_eq!(id.staging_name().as_str(), "acme_widgets");
/// assert_eq!(PackageIdentity::Application.staging_name().as_str(), "__app__");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageIdentity {
    /// The application being built (no owning package).
    Application,
    /// A named package.
    Package(String),
}

impl PackageIdentity {
    /// Parses and validates a package name.
    pub fn parse(name: &str) -> Result<Self> {
        validate_package_name(name)?;
        Ok(Self::Package(name.to_string()))
    }

    /// Builds an identity from the host's nullable package name.
    pub fn from_option(name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) => Self::parse(name),
            None => Ok(Self::Application),
        }
    }

    /// Package name, or `None` for the application.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Application => None,
            Self::Package(name) => Some(name),
        }
    }

    /// Returns true for the application sentinel.
    pub fn is_application(&self) -> bool {
        matches!(self, Self::Application)
    }

    /// Derives the file-system safe staging name.
    pub fn staging_name(&self) -> StagingName {
        match self {
            Self::Application => StagingName(APP_STAGING_NAME.to_string()),
            Self::Package(name) => StagingName(name.replace(':', "_")),
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => f.write_str(APP_STAGING_NAME),
            Self::Package(name) => f.write_str(name),
        }
    }
}

fn validate_package_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidPackageName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.matches(':').count() > 1 {
        return Err(invalid("at most one `:` is allowed"));
    }
    if name.starts_with(':') || name.ends_with(':') {
        return Err(invalid("author prefix and name must both be non-empty"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '.' | '-' | ':'))
    {
        return Err(invalid(&format!("character `{}` is not allowed", c)));
    }
    Ok(())
}

/// Directory and module name of a package inside a staging root.
///
/// Derived from [`PackageIdentity::staging_name`]; the mapping is reversible
/// through [`StagingName::to_identity`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StagingName(String);

impl StagingName {
    /// Borrowed string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a staging directory name, accepting only names some package
    /// identity maps to.
    pub fn parse(name: &str) -> Result<Self> {
        let staging = Self(name.to_string());
        staging.to_identity()?;
        Ok(staging)
    }

    /// Recovers the package identity this name was derived from.
    pub fn to_identity(&self) -> Result<PackageIdentity> {
        if self.0 == APP_STAGING_NAME {
            return Ok(PackageIdentity::Application);
        }
        PackageIdentity::parse(&self.0.replace('_', ":"))
    }
}

impl fmt::Display for StagingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StagingName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
