//! Core types for runtime version handling
//!
//! The host platform identifies each release by a monotonically increasing
//! integer API level. Every capability table is keyed by this value.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::errors::CompatError;

// ----------------------------------------------------------------------------
// API Level
// ----------------------------------------------------------------------------

/// Runtime version of the host platform (an ordered integer API level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiLevel(u32);

impl ApiLevel {
    /// Lowest level of any release; brackets starting here apply everywhere
    pub const BASE: Self = Self(1);
    pub const GINGERBREAD: Self = Self(9);
    pub const GINGERBREAD_MR1: Self = Self(10);
    pub const HONEYCOMB: Self = Self(11);
    pub const ICE_CREAM_SANDWICH: Self = Self(14);
    pub const ICE_CREAM_SANDWICH_MR1: Self = Self(15);
    pub const JELLY_BEAN: Self = Self(16);
    pub const JELLY_BEAN_MR2: Self = Self(18);
    pub const KITKAT: Self = Self(19);
    pub const LOLLIPOP: Self = Self(21);
    pub const MARSHMALLOW: Self = Self(23);

    /// Create an API level from its raw value
    pub const fn new(level: u32) -> Self {
        Self(level)
    }

    /// Get the raw integer value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Check whether this runtime satisfies a minimum level
    pub const fn at_least(self, minimum: ApiLevel) -> bool {
        self.0 >= minimum.0
    }

    /// Release name for the levels referenced by the capability tables
    pub fn codename(self) -> Option<&'static str> {
        let name = match self.0 {
            9 => "Gingerbread",
            10 => "Gingerbread MR1",
            11 => "Honeycomb",
            14 => "Ice Cream Sandwich",
            15 => "Ice Cream Sandwich MR1",
            16 => "Jelly Bean",
            18 => "Jelly Bean MR2",
            19 => "KitKat",
            21 => "Lollipop",
            23 => "Marshmallow",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u32> for ApiLevel {
    fn from(level: u32) -> Self {
        Self(level)
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.codename() {
            Some(name) => write!(f, "API {} ({})", self.0, name),
            None => write!(f, "API {}", self.0),
        }
    }
}

impl FromStr for ApiLevel {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both "23" and "API 23"
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("API")
            .map(str::trim_start)
            .unwrap_or(trimmed);

        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| CompatError::config_error(format!("Invalid API level: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(ApiLevel::KITKAT > ApiLevel::JELLY_BEAN_MR2);
        assert!(ApiLevel::new(19).at_least(ApiLevel::KITKAT));
        assert!(!ApiLevel::new(18).at_least(ApiLevel::KITKAT));
    }

    #[test]
    fn test_parse() {
        assert_eq!("23".parse::<ApiLevel>().unwrap(), ApiLevel::MARSHMALLOW);
        assert_eq!("API 21".parse::<ApiLevel>().unwrap(), ApiLevel::LOLLIPOP);
        assert!("marshmallow".parse::<ApiLevel>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ApiLevel::LOLLIPOP.to_string(), "API 21 (Lollipop)");
        assert_eq!(ApiLevel::new(30).to_string(), "API 30");
    }
}
