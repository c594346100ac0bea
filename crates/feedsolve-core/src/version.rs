//! Implementation version parsing, comparison, and range matching.
//!
//! Versions follow the grammar
//!
//! ```text
//! Version    := DottedList ("-" Modifier? DottedList?)*
//! DottedList := Integer ("." Integer)*
//! Modifier   := "pre" | "rc" | "post"
//! ```
//!
//! - Dotted lists compare element by element; a strict prefix sorts first
//!   (`1.0 < 1.0.0`)
//! - Additional parts compare modifier first: `pre` < `rc` < none < `post`
//! - A missing additional part counts as "no modifier, empty list", so
//!   `1.0-pre1 < 1.0 < 1.0-1 < 1.0-post`

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use feedsolve_util::errors::SolveError;
use serde::{Deserialize, Serialize};

/// A parsed implementation version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImplementationVersion {
    first: Vec<u64>,
    /// Trailing default parts are trimmed so structural equality agrees with `Ord`.
    additional: Vec<VersionPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
struct VersionPart {
    modifier: Modifier,
    list: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
enum Modifier {
    Pre,
    Rc,
    #[default]
    None,
    Post,
}

impl ImplementationVersion {
    pub fn parse(value: &str) -> Result<Self, SolveError> {
        let mut parts = value.split('-');
        let first = parts.next().unwrap_or_default();
        let first = parse_dotted_list(first).ok_or_else(|| SolveError::Parse {
            message: format!("version '{value}' must start with a dotted list of integers"),
        })?;
        if first.is_empty() {
            return Err(SolveError::Parse {
                message: format!("version '{value}' must start with a dotted list of integers"),
            });
        }

        let mut additional = Vec::new();
        for part in parts {
            additional.push(parse_part(part).ok_or_else(|| SolveError::Parse {
                message: format!("invalid version part '{part}' in '{value}'"),
            })?);
        }
        while additional.last().is_some_and(|p| *p == VersionPart::default()) {
            additional.pop();
        }

        Ok(Self { first, additional })
    }
}

fn parse_dotted_list(s: &str) -> Option<Vec<u64>> {
    if s.is_empty() {
        return Some(Vec::new());
    }
    s.split('.').map(|n| n.parse::<u64>().ok()).collect()
}

fn parse_part(s: &str) -> Option<VersionPart> {
    let (modifier, rest) = if let Some(rest) = s.strip_prefix("pre") {
        (Modifier::Pre, rest)
    } else if let Some(rest) = s.strip_prefix("rc") {
        (Modifier::Rc, rest)
    } else if let Some(rest) = s.strip_prefix("post") {
        (Modifier::Post, rest)
    } else {
        (Modifier::None, s)
    };
    Some(VersionPart {
        modifier,
        list: parse_dotted_list(rest)?,
    })
}

impl Ord for ImplementationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = self.first.cmp(&other.first);
        if ord != Ordering::Equal {
            return ord;
        }
        let default = VersionPart::default();
        let max_len = self.additional.len().max(other.additional.len());
        for i in 0..max_len {
            let a = self.additional.get(i).unwrap_or(&default);
            let b = other.additional.get(i).unwrap_or(&default);
            let ord = a
                .modifier
                .cmp(&b.modifier)
                .then_with(|| a.list.cmp(&b.list));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for ImplementationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, list: &[u64]) -> fmt::Result {
    for (i, n) in list.iter().enumerate() {
        if i > 0 {
            f.write_str(".")?;
        }
        write!(f, "{n}")?;
    }
    Ok(())
}

impl fmt::Display for ImplementationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.first)?;
        for part in &self.additional {
            f.write_str("-")?;
            match part.modifier {
                Modifier::Pre => f.write_str("pre")?,
                Modifier::Rc => f.write_str("rc")?,
                Modifier::Post => f.write_str("post")?,
                Modifier::None => {}
            }
            write_list(f, &part.list)?;
        }
        Ok(())
    }
}

impl FromStr for ImplementationVersion {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImplementationVersion {
    type Error = SolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImplementationVersion> for String {
    fn from(value: ImplementationVersion) -> Self {
        value.to_string()
    }
}

/// A set of acceptable versions.
///
/// Written as `|`-separated alternatives, each one of:
/// `a..!b` (from `a` inclusive up to `b` exclusive, either side optional),
/// `!v` (anything but `v`) or `v` (exactly `v`).
/// A range without alternatives accepts every version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    parts: Vec<RangePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RangePart {
    Exact(ImplementationVersion),
    Exclude(ImplementationVersion),
    Span {
        not_before: Option<ImplementationVersion>,
        before: Option<ImplementationVersion>,
    },
}

impl RangePart {
    fn parse(value: &str) -> Result<Self, SolveError> {
        if let Some((start, end)) = value.split_once("..") {
            let start = start.trim();
            let end = end.trim();
            let not_before = if start.is_empty() {
                None
            } else {
                Some(ImplementationVersion::parse(start)?)
            };
            let before = if end.is_empty() {
                None
            } else {
                let end = end.strip_prefix('!').ok_or_else(|| SolveError::Parse {
                    message: format!("upper bound '{end}' of a range must be exclusive (prefix '!')"),
                })?;
                Some(ImplementationVersion::parse(end.trim())?)
            };
            Ok(Self::Span { not_before, before })
        } else if let Some(excluded) = value.strip_prefix('!') {
            Ok(Self::Exclude(ImplementationVersion::parse(excluded.trim())?))
        } else {
            Ok(Self::Exact(ImplementationVersion::parse(value)?))
        }
    }

    fn matches(&self, version: &ImplementationVersion) -> bool {
        match self {
            Self::Exact(v) => v == version,
            Self::Exclude(v) => v != version,
            Self::Span { not_before, before } => {
                if not_before.as_ref().is_some_and(|start| version < start) {
                    return false;
                }
                if before.as_ref().is_some_and(|end| version >= end) {
                    return false;
                }
                true
            }
        }
    }
}

impl fmt::Display for RangePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{v}"),
            Self::Exclude(v) => write!(f, "!{v}"),
            Self::Span { not_before, before } => {
                if let Some(start) = not_before {
                    write!(f, "{start}")?;
                }
                f.write_str("..")?;
                if let Some(end) = before {
                    write!(f, "!{end}")?;
                }
                Ok(())
            }
        }
    }
}

impl VersionRange {
    /// Parse a range expression such as `1.0..!2.0 | 2.5`.
    pub fn parse(value: &str) -> Result<Self, SolveError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SolveError::Parse {
                message: "version range must not be empty".to_string(),
            });
        }
        let parts = value
            .split('|')
            .map(|part| RangePart::parse(part.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }

    /// `true` if no alternative was given, i.e. the range accepts everything.
    pub fn is_unrestricted(&self) -> bool {
        self.parts.is_empty()
    }

    /// Check if a version satisfies any alternative of this range.
    pub fn matches(&self, version: &ImplementationVersion) -> bool {
        self.parts.is_empty() || self.parts.iter().any(|p| p.matches(version))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl FromStr for VersionRange {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = SolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(value: VersionRange) -> Self {
        value.to_string()
    }
}
