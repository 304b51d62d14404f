//! Device classes.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of device sharing one factory signature and capability surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Class {
    /// Energy meter (grid, pv, battery, charge meters).
    Meter,
    /// Wallbox / EVSE.
    Charger,
    /// Electric vehicle.
    Vehicle,
}

impl Class {
    /// All classes in configuration order.
    pub const ALL: [Class; 3] = [Class::Meter, Class::Charger, Class::Vehicle];

    /// Lowercase class name as used in configuration and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meter => "meter",
            Self::Charger => "charger",
            Self::Vehicle => "vehicle",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Class {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "meter" => Ok(Self::Meter),
            "charger" => Ok(Self::Charger),
            "vehicle" => Ok(Self::Vehicle),
            _ => Err(ConfigError::ValidationError(format!("invalid class: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_case_insensitive() {
        assert_eq!("Meter".parse::<Class>().unwrap(), Class::Meter);
        assert_eq!("CHARGER".parse::<Class>().unwrap(), Class::Charger);
        assert_eq!("vehicle".parse::<Class>().unwrap(), Class::Vehicle);
    }

    #[test]
    fn parse_unknown_class() {
        let err = "inverter".parse::<Class>().unwrap_err();
        assert!(err.to_string().contains("invalid class: inverter"));
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for class in Class::ALL {
            assert_eq!(class.to_string().parse::<Class>().unwrap(), class);
        }
    }
}
