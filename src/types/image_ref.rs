// ABOUTME: Container image reference parsing and base name derivation.
// ABOUTME: Handles formats like app, app:tag, registry/namespace/app:tag@digest.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),

    #[error("image name segment must start with a letter or digit: {0}")]
    InvalidBaseName(String),
}

/// A parsed, pullable image reference.
///
/// The last path segment of the repository name is the image's base name:
/// `registry.example.com/team/app:v2` has base name `app`. Every instance
/// of the same service shares it, whatever the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input.chars().find(|c| {
            !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_' | '@')
        }) {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        let (without_digest, digest) = match input.split_once('@') {
            Some((before, after)) if !after.is_empty() => (before, Some(after.to_string())),
            Some(_) => return Err(ParseImageRefError::InvalidFormat(input.to_string())),
            None => (input, None),
        };

        // A colon followed by a slash belongs to a registry port, not a tag.
        let (without_tag, tag) = match without_digest.rsplit_once(':') {
            Some((_, after)) if after.contains('/') => (without_digest, None),
            Some((_, "")) => return Err(ParseImageRefError::InvalidFormat(input.to_string())),
            Some((before, after)) => (before, Some(after.to_string())),
            None => (without_digest, None),
        };

        let (registry, name) = Self::split_registry(without_tag)?;

        if name.split('/').any(str::is_empty) {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        let base = name.rsplit('/').next().unwrap_or(&name);
        if !base.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(ParseImageRefError::InvalidBaseName(base.to_string()));
        }

        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    fn split_registry(input: &str) -> Result<(Option<String>, String), ParseImageRefError> {
        match input.split_once('/') {
            None => Ok((None, input.to_string())),
            Some((first, rest)) => {
                if first.contains('.') || first.contains(':') || first == "localhost" {
                    Ok((Some(first.to_string()), rest.to_string()))
                } else {
                    Ok((None, input.to_string()))
                }
            }
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// Repository path without registry, tag or digest (`team/app`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Final path segment of the repository name (`app`).
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_registry_namespace_and_tag() {
        let img = ImageRef::parse("registry.example.com/team/app:v2").unwrap();
        assert_eq!(img.base_name(), "app");
        assert_eq!(img.registry(), Some("registry.example.com"));
        assert_eq!(img.name(), "team/app");
        assert_eq!(img.tag(), Some("v2"));
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let img = ImageRef::parse("localhost:5000/app").unwrap();
        assert_eq!(img.registry(), Some("localhost:5000"));
        assert_eq!(img.base_name(), "app");
        assert_eq!(img.tag(), Some("latest"));
    }

    #[test]
    fn digest_is_stripped_from_base_name() {
        let img = ImageRef::parse("ghcr.io/org/worker@sha256:abc123").unwrap();
        assert_eq!(img.base_name(), "worker");
        assert_eq!(img.digest(), Some("sha256:abc123"));
        assert!(img.tag().is_none());
    }

    #[test]
    fn rejects_empty_path_segments() {
        assert!(matches!(
            ImageRef::parse("registry.example.com//app"),
            Err(ParseImageRefError::InvalidFormat(_))
        ));
        assert!(matches!(
            ImageRef::parse("registry.example.com/team/"),
            Err(ParseImageRefError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_base_name_with_leading_punctuation() {
        assert_eq!(
            ImageRef::parse("team/_app:v1"),
            Err(ParseImageRefError::InvalidBaseName("_app".to_string()))
        );
    }

    #[test]
    fn rejects_dangling_tag_separator() {
        assert!(ImageRef::parse("app:").is_err());
        assert!(ImageRef::parse("app@").is_err());
    }
}
