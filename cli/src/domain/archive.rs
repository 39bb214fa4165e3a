//! Image references and deterministic archive naming.

use crate::domain::error::StageError;

/// Suffix of every per-architecture image archive.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// A `<name>:<tag>` container image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository name, e.g. `activecm/zeek`.
    pub name: String,
    /// Tag, used as the package version, e.g. `4.2.0`.
    pub tag: String,
}

impl ImageReference {
    /// Parse `<name>:<tag>`.
    ///
    /// The tag separator is the last `:` after the last `/`, so registry
    /// ports (`registry:5000/zeek:4.2.0`) are not mistaken for tags.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::InvalidReference`] when the name or tag is missing.
    pub fn parse(reference: &str) -> Result<Self, StageError> {
        let invalid = || StageError::InvalidReference(reference.to_string());
        let reference = reference.trim();
        let last_segment = reference.rfind('/').map_or(0, |i| i + 1);
        let colon = reference[last_segment..]
            .rfind(':')
            .map(|i| i + last_segment)
            .ok_or_else(invalid)?;
        let (name, tag) = (&reference[..colon], &reference[colon + 1..]);
        if name.is_empty() || tag.is_empty() || name.contains('@') {
            return Err(invalid());
        }
        Ok(Self {
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Reference with a `docker://` transport prefix for registry tools.
    #[must_use]
    pub fn transport(&self) -> String {
        format!("docker://{self}")
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Replace every character that is not ASCII alphanumeric with `_`.
#[must_use]
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// File name of the gzip image archive for `name:version` on `arch`.
#[must_use]
pub fn image_archive_name(name: &str, version: &str, arch: &str) -> String {
    format!("{}_{arch}{ARCHIVE_SUFFIX}", sanitize(&format!("{name}:{version}")))
}

/// File name of the sealed package for `version`.
#[must_use]
pub fn package_archive_name(top_dir: &str, version: &str) -> String {
    format!("{top_dir}-{}.tar", sanitize(version))
}
