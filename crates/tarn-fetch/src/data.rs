//! Data layer: immutable types describing one fetch operation.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("invalid mirror location: {0:?}")]
pub struct ParseLocationError(pub String);

/// One candidate mirror location, an absolute URI.
///
/// The fetch layer never interprets the URI beyond joining a filename onto
/// it; scheme handling belongs to the engine backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location(String);

impl FromStr for Location {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.contains("://") {
            return Err(ParseLocationError(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl Location {
    pub fn as_str(&self) -> &str { &self.0 }

    /// Append `filename` to this location, treating the location as a base
    /// directory. A single separating slash is inserted when the base does
    /// not already end in one.
    pub fn join(&self, filename: &str) -> Location {
        let base = self.0.trim_end_matches('/');
        Location(format!("{base}/{filename}"))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Scheduler tag forwarded to the engine with each request. Lower values
/// run first; the blocking bridge always submits [`Priority::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub i32);

impl Priority {
    pub const DEFAULT: Priority = Priority(0);
}

impl Default for Priority {
    fn default() -> Self { Self::DEFAULT }
}

/// Per-call fetch descriptor handed to a [`FetchEngine`].
///
/// Borrows the mirror list and filename from the caller; both must stay
/// valid for the duration of the submitted operation.
///
/// [`FetchEngine`]: crate::FetchEngine
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Candidate locations in priority order. Fallback across them is the
    /// engine's responsibility.
    pub mirrors: &'a [Location],
    /// Target filename appended to each mirror entry by the engine. When
    /// absent, each mirror entry is itself a complete locator.
    pub filename: Option<&'a str>,
    /// Byte ceiling for the fetched content. Zero disables the ceiling.
    pub max_size: u64,
    pub priority: Priority,
}
