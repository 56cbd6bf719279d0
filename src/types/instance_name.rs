// ABOUTME: Container instance name validation and temporary name generation.
// ABOUTME: Enforces the runtime's name rules: [a-zA-Z0-9][a-zA-Z0-9_.-]*.

use super::image_ref::ImageRef;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use thiserror::Error;

/// Timestamp layout embedded in temporary names (microsecond precision).
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceNameError {
    #[error("instance name cannot be empty")]
    Empty,

    #[error("instance name exceeds maximum length of 128 characters")]
    TooLong,

    #[error("instance name must start with a letter or digit")]
    InvalidStart,

    #[error("invalid character in instance name: '{0}'")]
    InvalidChar(char),
}

/// A name the container runtime accepts for an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceName(String);

impl InstanceName {
    pub fn new(value: &str) -> Result<Self, InstanceNameError> {
        if value.is_empty() {
            return Err(InstanceNameError::Empty);
        }

        if value.len() > 128 {
            return Err(InstanceNameError::TooLong);
        }

        if !value.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(InstanceNameError::InvalidStart);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-'))
        {
            return Err(InstanceNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    /// The production name for instances of `image`.
    pub fn base_of(image: &ImageRef) -> Result<Self, InstanceNameError> {
        Self::new(image.base_name())
    }

    /// A disposable name for a new instance of `self`, unique per call.
    pub fn temporary(&self) -> Self {
        let token = rand::thread_rng().r#gen::<u32>() & 0x00ff_ffff;
        self.temporary_at(Utc::now(), token)
    }

    /// Deterministic form of [`temporary`](Self::temporary).
    pub fn temporary_at(&self, at: DateTime<Utc>, token: u32) -> Self {
        Self(format!(
            "{}_{}_{:06x}",
            self.0,
            at.format(TIMESTAMP_FORMAT),
            token & 0x00ff_ffff
        ))
    }

    /// Whether `self` looks like a temporary name derived from `base`.
    pub fn is_temporary_of(&self, base: &InstanceName) -> bool {
        let Some(rest) = self
            .0
            .strip_prefix(base.as_str())
            .and_then(|r| r.strip_prefix('_'))
        else {
            return false;
        };
        match rest.split_once('_') {
            Some((stamp, token)) => {
                stamp.len() == 20
                    && stamp.chars().all(|c| c.is_ascii_digit())
                    && token.len() == 6
                    && token.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn temporary_at_embeds_timestamp_and_token() {
        let base = InstanceName::new("app").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let tmp = base.temporary_at(at, 0xa1b2c3);
        assert_eq!(tmp.as_str(), "app_20240101120000000000_a1b2c3");
        assert!(tmp.is_temporary_of(&base));
    }

    #[test]
    fn token_is_masked_to_six_hex_digits() {
        let base = InstanceName::new("app").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let tmp = base.temporary_at(at, 0xffff_ffff);
        assert!(tmp.as_str().ends_with("_ffffff"));
    }

    #[test]
    fn rapid_temporaries_differ() {
        let base = InstanceName::new("app").unwrap();
        let a = base.temporary();
        let b = base.temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary_of(&base));
        assert!(b.is_temporary_of(&base));
    }

    #[test]
    fn production_name_is_not_temporary() {
        let base = InstanceName::new("app").unwrap();
        assert!(!base.is_temporary_of(&base));
        let other = InstanceName::new("app_v2").unwrap();
        assert!(!other.is_temporary_of(&base));
    }

    #[test]
    fn rejects_invalid_names() {
        assert_eq!(InstanceName::new(""), Err(InstanceNameError::Empty));
        assert_eq!(InstanceName::new("-app"), Err(InstanceNameError::InvalidStart));
        assert_eq!(
            InstanceName::new("app/x"),
            Err(InstanceNameError::InvalidChar('/'))
        );
        assert_eq!(
            InstanceName::new(&"a".repeat(129)),
            Err(InstanceNameError::TooLong)
        );
    }
}
