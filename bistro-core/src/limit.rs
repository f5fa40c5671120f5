//! Result-set limit with clamping rules

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bound on a top-N query result set.
///
/// Always within `[1, 100]`; a raw value outside that range is clamped
/// before it ever reaches the primary store. The default is 10, used
/// when the caller supplied no limit or a non-numeric one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryLimit(u32);

impl QueryLimit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;
    pub const DEFAULT: u32 = 10;

    /// Create a limit, clamping to `[MIN, MAX]`.
    pub fn new(raw: u32) -> Self {
        Self(raw.clamp(Self::MIN, Self::MAX))
    }

    /// Parse a raw query parameter.
    ///
    /// Absent or non-numeric input falls back to the default; numeric
    /// input is clamped.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.and_then(|s| s.trim().parse::<u32>().ok()) {
            Some(n) => Self::new(n),
            None => Self::default(),
        }
    }

    /// The effective limit value.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for QueryLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for QueryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
