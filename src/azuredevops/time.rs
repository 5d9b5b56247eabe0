//! Timestamp decoding for Azure DevOps payloads.
//!
//! Azure DevOps serializes unset dates as `0001-01-01T00:00:00` (no offset),
//! which is not valid RFC 3339. That literal and the empty string decode to
//! the zero value; anything else must be strict RFC 3339.

use chrono::{DateTime, FixedOffset};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The literal Azure DevOps uses for an unset date.
pub const ZERO_TIME_LITERAL: &str = "0001-01-01T00:00:00";

const ZERO_TIME_RFC3339: &str = "0001-01-01T00:00:00Z";

/// A timestamp that may be the zero value (`None`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomTime(pub Option<DateTime<FixedOffset>>);

impl CustomTime {
    pub fn zero() -> Self {
        Self(None)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        if value.is_empty() || value == ZERO_TIME_LITERAL {
            return Ok(Self::zero());
        }
        DateTime::parse_from_rfc3339(value).map(|t| Self(Some(t)))
    }
}

impl From<DateTime<FixedOffset>> for CustomTime {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(Some(value))
    }
}

impl fmt::Display for CustomTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(t) => f.write_str(&t.to_rfc3339()),
            None => f.write_str(ZERO_TIME_RFC3339),
        }
    }
}

impl<'de> Deserialize<'de> for CustomTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(Self::zero()),
            Some(value) => Self::parse(&value)
                .map_err(|e| de::Error::custom(format!("invalid timestamp {:?}: {}", value, e))),
        }
    }
}

impl Serialize for CustomTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
