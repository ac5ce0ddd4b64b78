//! Module specifiers the bundler must leave as runtime imports.

use std::fmt;

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// A literal module specifier or a pattern matched against specifiers.
#[derive(Debug, Clone)]
pub enum External {
    Literal(String),
    Pattern(Regex),
}

impl External {
    pub fn literal(id: impl Into<String>) -> Self {
        External::Literal(id.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(External::Pattern)
            .map_err(|source| ConfigError::InvalidExternal {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn matches(&self, id: &str) -> bool {
        match self {
            External::Literal(literal) => literal == id,
            External::Pattern(regex) => regex.is_match(id),
        }
    }
}

impl PartialEq for External {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (External::Literal(a), External::Literal(b)) => a == b,
            (External::Pattern(a), External::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            External::Literal(id) => f.write_str(id),
            External::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Whether any of `externals` matches `id`.
pub fn is_external(externals: &[External], id: &str) -> bool {
    externals.iter().any(|external| external.matches(id))
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawExternal {
    Literal(String),
    Pattern { pattern: String },
}

impl Serialize for External {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            External::Literal(id) => RawExternal::Literal(id.clone()),
            External::Pattern(regex) => RawExternal::Pattern {
                pattern: regex.as_str().to_string(),
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for External {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawExternal::deserialize(deserializer)? {
            RawExternal::Literal(id) => Ok(External::Literal(id)),
            RawExternal::Pattern { pattern } => {
                External::pattern(&pattern).map_err(D::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_literals_and_patterns() {
        let externals: Vec<External> =
            serde_json::from_value(json!(["react", { "pattern": "^@internal/" }])).unwrap();

        assert!(externals[0].matches("react"));
        assert!(!externals[0].matches("react-dom"));
        assert!(externals[1].matches("@internal/utils"));
        assert!(is_external(&externals, "@internal/x"));
        assert!(!is_external(&externals, "lodash"));
    }

    #[test]
    fn rejects_invalid_patterns() {
        let result: Result<Vec<External>, _> = serde_json::from_value(json!([{ "pattern": "(" }]));
        assert!(result.is_err());
    }
}
