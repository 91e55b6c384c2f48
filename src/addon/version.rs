//! Version Constraints
//!
//! Parses dot-separated numeric versions and evaluates constraint strings
//! (exact, `>=`, `>`, `<=`, `<`, `^`, `~`, `*`) against them. Everything here
//! is pure: no I/O, no global state.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Malformed version or constraint string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} '{input}': {reason}")]
pub struct ConstraintError {
    pub kind: &'static str,
    pub input: String,
    pub reason: String,
}

impl ConstraintError {
    fn version<S: Into<String>>(input: &str, reason: S) -> Self {
        Self { kind: "version", input: input.to_string(), reason: reason.into() }
    }

    fn constraint<S: Into<String>>(input: &str, reason: S) -> Self {
        Self { kind: "constraint", input: input.to_string(), reason: reason.into() }
    }
}

/// A parsed version
///
/// Components compare as integers; missing trailing components count as zero,
/// so `1.2` and `1.2.0` are equal. Pre-release and build suffixes are dropped.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    /// Parse a version string such as `1.2.3`, `2.0` or `1.0.0-beta+7`
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ConstraintError::version(input, "version is empty"));
        }

        let core = trimmed
            .split(|c| c == '-' || c == '+')
            .next()
            .unwrap_or_default();

        let parts = core
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    return Err(ConstraintError::version(input, "empty version component"));
                }
                part.parse::<u64>().map_err(|_| {
                    ConstraintError::version(input, format!("component '{}' is not numeric", part))
                })
            })
            .collect::<Result<Vec<u64>, _>>()?;

        Ok(Self { parts })
    }

    /// Component at `index`, zero when absent
    pub fn component(&self, index: usize) -> u64 {
        self.parts.get(index).copied().unwrap_or(0)
    }

    /// First component
    pub fn major(&self) -> u64 {
        self.component(0)
    }

    /// Second component
    pub fn minor(&self) -> u64 {
        self.component(1)
    }

    fn from_parts(parts: Vec<u64>) -> Self {
        Self { parts }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        f.write_str(&text.join("."))
    }
}

impl FromStr for Version {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Comparison operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Exact,
    GreaterEq,
    Greater,
    LessEq,
    Less,
    Caret,
    Tilde,
}

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// `*`: any well-formed version
    Any,
    /// Operator applied to a base version
    Compare { op: Operator, version: Version },
}

impl VersionConstraint {
    /// Parse a constraint string
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ConstraintError::constraint(input, "constraint is empty"));
        }
        if trimmed == "*" {
            return Ok(VersionConstraint::Any);
        }

        // Two-character operators first so `>=` is not read as `>`
        let (op, rest) = if let Some(rest) = trimmed.strip_prefix(">=") {
            (Operator::GreaterEq, rest)
        } else if let Some(rest) = trimmed.strip_prefix("<=") {
            (Operator::LessEq, rest)
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            (Operator::Greater, rest)
        } else if let Some(rest) = trimmed.strip_prefix('<') {
            (Operator::Less, rest)
        } else if let Some(rest) = trimmed.strip_prefix('^') {
            (Operator::Caret, rest)
        } else if let Some(rest) = trimmed.strip_prefix('~') {
            (Operator::Tilde, rest)
        } else if let Some(rest) = trimmed.strip_prefix('=') {
            (Operator::Exact, rest)
        } else {
            (Operator::Exact, trimmed)
        };

        let version = Version::parse(rest).map_err(|e| {
            ConstraintError::constraint(input, format!("bad version: {}", e.reason))
        })?;

        Ok(VersionConstraint::Compare { op, version })
    }

    /// Check whether `version` falls within this constraint
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionConstraint::Any => true,
            VersionConstraint::Compare { op, version: base } => match op {
                Operator::Exact => version == base,
                Operator::GreaterEq => version >= base,
                Operator::Greater => version > base,
                Operator::LessEq => version <= base,
                Operator::Less => version < base,
                Operator::Caret => {
                    let upper = base
                        .major()
                        .checked_add(1)
                        .map(|major| Version::from_parts(vec![major, 0, 0]));
                    version >= base && below(version, upper.as_ref())
                }
                Operator::Tilde => {
                    let upper = base
                        .minor()
                        .checked_add(1)
                        .map(|minor| Version::from_parts(vec![base.major(), minor, 0]))
                        .or_else(|| {
                            let major = base.major().checked_add(1)?;
                            Some(Version::from_parts(vec![major, 0, 0]))
                        });
                    version >= base && below(version, upper.as_ref())
                }
            },
        }
    }
}

/// An upper bound that overflowed `u64` leaves the range open
fn below(version: &Version, upper: Option<&Version>) -> bool {
    upper.map_or(true, |upper| version < upper)
}

impl FromStr for VersionConstraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Check whether `version` satisfies `constraint`
///
/// Malformed input on either side is an error, never a silent match.
pub fn satisfies(version: &str, constraint: &str) -> Result<bool, ConstraintError> {
    let constraint = VersionConstraint::parse(constraint)?;
    let version = Version::parse(version)?;
    Ok(constraint.matches(&version))
}
