use std::sync::LazyLock;
use std::{cmp, fmt, str::FromStr};

use chrono::DurationRound;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
use smol_str::{SmolStr, ToSmolStr};

use crate::types::string::AtStrError;

/// Regex for ISO 8601 datetime validation per AT Protocol spec
pub static ISO8601_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|(\+[0-9]{2}|\-[0-9][1-9]):[0-9]{2})$").unwrap()
});

/// AT Protocol datetime (ISO 8601 with specific requirements)
///
/// Lexicon datetimes use ISO 8601 format with these requirements:
/// - Must include timezone (strongly prefer UTC with 'Z')
/// - Requires whole seconds precision minimum
/// - Uses uppercase 'T' to separate date and time
///
/// Examples: `"1985-04-12T23:20:50.123Z"`, `"2023-01-01T00:00:00+00:00"`
///
/// The serialized form is kept as parsed so values round-trip exactly.
#[derive(Clone, Debug, Eq, Hash)]
pub struct Datetime {
    serialized: SmolStr,
    dt: chrono::DateTime<chrono::FixedOffset>,
}

impl PartialEq for Datetime {
    fn eq(&self, other: &Self) -> bool {
        self.dt == other.dt
    }
}

impl Ord for Datetime {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.dt.cmp(&other.dt)
    }
}

impl PartialOrd for Datetime {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Datetime {
    /// The current date and time in UTC, at microsecond precision.
    pub fn now() -> Self {
        Self::new(chrono::Utc::now().fixed_offset())
    }

    /// Constructs a new Lexicon timestamp, rounded to microseconds.
    pub fn new(dt: chrono::DateTime<chrono::FixedOffset>) -> Self {
        let dt = dt
            .duration_round(chrono::Duration::microseconds(1))
            .unwrap_or(dt);
        let serialized = dt
            .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
            .to_smolstr();
        Self { serialized, dt }
    }

    /// The string form, exactly as parsed
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// The parsed timestamp
    pub fn as_chrono(&self) -> &chrono::DateTime<chrono::FixedOffset> {
        &self.dt
    }
}

impl FromStr for Datetime {
    type Err = AtStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono parses RFC 3339; the regex restricts input to the ISO 8601
        // subset Lexicon allows.
        if !ISO8601_REGEX.is_match(s) {
            return Err(AtStrError::regex("datetime", s));
        }
        let dt = chrono::DateTime::parse_from_rfc3339(s)
            .map_err(|e| AtStrError::parse("datetime", s, e))?;
        Ok(Self {
            serialized: s.to_smolstr(),
            dt,
        })
    }
}

impl<'de> Deserialize<'de> for Datetime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: String = Deserialize::deserialize(deserializer)?;
        Self::from_str(&value).map_err(D::Error::custom)
    }
}

impl Serialize for Datetime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.serialized)
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

impl From<chrono::DateTime<chrono::FixedOffset>> for Datetime {
    fn from(dt: chrono::DateTime<chrono::FixedOffset>) -> Self {
        Self::new(dt)
    }
}
