use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::de::{Unexpected, Visitor};
use serde::{Deserialize, Deserializer};

/// A duration expressed in the config either as a plain number of seconds or as a
/// string such as `1d 12h`, `30m` or `45s`.
#[derive(Debug, Clone, Copy)]
pub struct Duration(std::time::Duration);

impl Duration {
    pub const fn from_secs(seconds: u64) -> Self {
        Self(std::time::Duration::from_secs(seconds))
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a duration")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_u64(v.try_into().map_err(E::custom)?)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Duration::from_secs(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                static REGEXP: OnceLock<Regex> = OnceLock::new();

                let regexp = REGEXP.get_or_init(|| {
                    Regex::new(
                        r"^(?:(?<days>\d+)d)? ?(?:(?<hours>\d+)h)? ?(?:(?<minutes>\d+)m)? ?(?:(?<seconds>\d+)s)?$",
                    )
                    .unwrap()
                });
                let Some(captures) = regexp.captures(v) else {
                    return Err(E::invalid_value(Unexpected::Str(v), &"a duration"));
                };

                let units = [
                    ("days", 86_400),
                    ("hours", 3_600),
                    ("minutes", 60),
                    ("seconds", 1),
                ];
                let mut total: u64 = 0;
                let mut matched = false;

                for (name, scale) in units {
                    let Some(m) = captures.name(name) else {
                        continue;
                    };

                    matched = true;
                    let count = m.as_str().parse::<u64>().map_err(|e| {
                        E::custom(format!("could not parse {name} (`{}`): {e}", m.as_str()))
                    })?;
                    total = count
                        .checked_mul(scale)
                        .and_then(|secs| total.checked_add(secs))
                        .ok_or_else(|| E::custom(format!("duration `{v}` is too large")))?;
                }

                if !matched {
                    return Err(E::invalid_value(Unexpected::Str(v), &"a duration"));
                }

                Ok(Duration::from_secs(total))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

impl From<std::time::Duration> for Duration {
    fn from(duration: std::time::Duration) -> Self {
        Self(duration)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(duration: Duration) -> Self {
        duration.0
    }
}
