use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The three nested levels of the work-breakdown hierarchy, outer to inner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Phase,
    Feature,
    Item,
}

impl PartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phase => "phase",
            Self::Feature => "feature",
            Self::Item => "item",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "phase" => Some(Self::Phase),
            "feature" => Some(Self::Feature),
            "item" => Some(Self::Item),
            _ => None,
        }
    }

    /// Capitalized label used in calendar summaries and Gantt task names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Phase => "Phase",
            Self::Feature => "Feature",
            Self::Item => "Item",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a schedulable node: kind plus the numeric id within that
/// kind's table, rendered as `phase-3`, `feature-12`, `item-7`.
///
/// Numeric ids are only unique within their own table, so cross-references
/// carry the kind prefix. Bare dependency references (just the number) are
/// resolved against every table; see `schedule::graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartRef {
    pub kind: PartKind,
    pub id: i64,
}

impl PartRef {
    pub fn new(kind: PartKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

/// Error parsing a `kind-id` part reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid part reference: {0:?}")]
pub struct ParsePartRefError(pub String);

impl FromStr for PartRef {
    type Err = ParsePartRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, digits) = s
            .rsplit_once('-')
            .ok_or_else(|| ParsePartRefError(s.to_string()))?;
        let kind = PartKind::from_str(prefix).ok_or_else(|| ParsePartRefError(s.to_string()))?;
        let id = digits
            .parse::<i64>()
            .map_err(|_| ParsePartRefError(s.to_string()))?;
        if id < 0 {
            return Err(ParsePartRefError(s.to_string()));
        }
        Ok(Self { kind, id })
    }
}

impl Serialize for PartRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Whether a part is internal work or an external deliverable/dependency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Internal,
    External,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(Self::Internal),
            "external" => Some(Self::External),
            _ => None,
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::Internal
    }
}
