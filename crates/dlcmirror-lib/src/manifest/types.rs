use super::error::ManifestMalformed;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Base URL every manifest-relative path is resolved against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorRoot(Url);

impl MirrorRoot {
    /// Parses `base`, appending a trailing `/` when missing so that relative
    /// paths extend the base instead of replacing its last segment.
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        let mut url = Url::parse(base)?;
        if url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self(url))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Resolves a manifest path. Manifests delimit path segments with `:`.
    pub fn resolve(&self, manifest_path: &str) -> Result<Url, url::ParseError> {
        let relative = manifest_path.replace(':', "/");
        Url::parse(&format!("{}{}", self.0, relative.trim_start_matches('/')))
    }
}

impl fmt::Display for MirrorRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestRole {
    RootManifest,
    SecondaryManifest,
    Package,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ManifestReference {
    pub url: Url,
    pub role: ManifestRole,
}

impl ManifestReference {
    pub fn new(url: Url, role: ManifestRole) -> Self {
        Self { url, role }
    }
}

/// References extracted from one manifest plus every element that had to be
/// skipped or patched up on the way.
#[derive(Clone, Debug, Default)]
pub struct ParsedManifest {
    pub references: Vec<ManifestReference>,
    pub warnings: Vec<ManifestMalformed>,
}

impl ParsedManifest {
    pub(crate) fn warn(&mut self, warning: ManifestMalformed) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub(crate) fn extend(&mut self, other: ParsedManifest) {
        self.references.extend(other.references);
        self.warnings.extend(other.warnings);
    }

    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.references.iter().map(|r| &r.url)
    }
}

/// Which entries of a secondary manifest archive are parsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryEntryPolicy {
    /// Only the first entry in archive order.
    #[default]
    First,
    /// Every entry, packages concatenated in archive order.
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_root_gains_trailing_slash() {
        let root = MirrorRoot::parse("http://cdn.example.com/gameasset/simpsons").unwrap();
        assert_eq!(root.url().as_str(), "http://cdn.example.com/gameasset/simpsons/");
    }

    #[test]
    fn test_resolve_rewrites_colons() {
        let root = MirrorRoot::parse("http://cdn.example.com/gameasset/simpsons/").unwrap();
        assert_eq!(
            root.resolve("dlc:Core:idx.zip").unwrap().as_str(),
            "http://cdn.example.com/gameasset/simpsons/dlc/Core/idx.zip"
        );
        assert_eq!(
            root.resolve("dlc/DLCIndex.zip").unwrap().as_str(),
            "http://cdn.example.com/gameasset/simpsons/dlc/DLCIndex.zip"
        );
    }

    #[test]
    fn test_resolve_keeps_leading_separator_inside_root() {
        let root = MirrorRoot::parse("http://cdn.example.com/simpsons/").unwrap();
        assert_eq!(
            root.resolve(":dlc:a.zip").unwrap().as_str(),
            "http://cdn.example.com/simpsons/dlc/a.zip"
        );
    }

    #[test]
    fn test_non_base_urls_are_rejected() {
        assert!(MirrorRoot::parse("mailto:someone@example.com").is_err());
        assert!(MirrorRoot::parse("not a url").is_err());
    }
}
