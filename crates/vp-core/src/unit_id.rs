//! Strongly-typed migration unit identifier.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Identifier of a migration unit, e.g. `20240215000000_add_owner_phone`.
///
/// Ordering is plain lexicographic byte order, which is why ids are expected
/// to carry a fixed-width timestamp prefix. Only ASCII letters, digits, `_`,
/// `-` and `.` are accepted so the id can be embedded in a SQL literal and a
/// file name without escaping surprises.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Validate and wrap an identifier.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvalidUnitId {
                id,
                reason: "identifier must not be empty".to_string(),
            });
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(CoreError::InvalidUnitId {
                reason: format!("unsupported character {bad:?}"),
                id,
            });
        }
        Ok(Self(id))
    }

    /// Create an identifier from a literal known to be valid.
    ///
    /// Panics on an invalid id; used for the built-in schema units.
    pub fn from_static(id: &'static str) -> Self {
        match Self::parse(id) {
            Ok(id) => id,
            Err(e) => panic!("{e}"),
        }
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for UnitId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UnitId::parse(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UnitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for UnitId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UnitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for UnitId {
    type Error = CoreError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl PartialEq<str> for UnitId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for UnitId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ids() {
        assert!(UnitId::parse("20240101000000_create_owners").is_ok());
        assert!(UnitId::parse("v1.2-seed").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            UnitId::parse(""),
            Err(CoreError::InvalidUnitId { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_quotes_and_spaces() {
        assert!(UnitId::parse("bad id").is_err());
        assert!(UnitId::parse("o'brien").is_err());
        assert!(UnitId::parse("semi;colon").is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = UnitId::parse("20240101000000_b").unwrap();
        let b = UnitId::parse("20240101000001_a").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: UnitId = serde_yaml::from_str("\"20240101_x\"").unwrap();
        assert_eq!(ok, "20240101_x");
        let err = serde_yaml::from_str::<UnitId>("\"has space\"");
        assert!(err.is_err());
    }
}
