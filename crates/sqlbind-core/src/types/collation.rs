//! Collations and character sets

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Character sets known to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterSet {
    Utf8mb4,
    Latin1,
    Binary,
}

impl std::fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharacterSet::Utf8mb4 => write!(f, "utf8mb4"),
            CharacterSet::Latin1 => write!(f, "latin1"),
            CharacterSet::Binary => write!(f, "binary"),
        }
    }
}

/// Collations known to the resolver
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Collation {
    #[default]
    #[serde(rename = "utf8mb4_0900_bin")]
    Utf8mb4_0900_bin,
    #[serde(rename = "utf8mb4_0900_ai_ci")]
    Utf8mb4_0900_ai_ci,
    #[serde(rename = "utf8mb4_general_ci")]
    Utf8mb4_general_ci,
    #[serde(rename = "latin1_swedish_ci")]
    Latin1_swedish_ci,
    #[serde(rename = "binary")]
    Binary,
}

impl Collation {
    pub fn character_set(&self) -> CharacterSet {
        match self {
            Collation::Utf8mb4_0900_bin
            | Collation::Utf8mb4_0900_ai_ci
            | Collation::Utf8mb4_general_ci => CharacterSet::Utf8mb4,
            Collation::Latin1_swedish_ci => CharacterSet::Latin1,
            Collation::Binary => CharacterSet::Binary,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Collation::Utf8mb4_0900_bin => "utf8mb4_0900_bin",
            Collation::Utf8mb4_0900_ai_ci => "utf8mb4_0900_ai_ci",
            Collation::Utf8mb4_general_ci => "utf8mb4_general_ci",
            Collation::Latin1_swedish_ci => "latin1_swedish_ci",
            Collation::Binary => "binary",
        }
    }

    /// Default collation for a character set
    pub fn for_character_set(charset: CharacterSet) -> Self {
        match charset {
            CharacterSet::Utf8mb4 => Collation::Utf8mb4_0900_bin,
            CharacterSet::Latin1 => Collation::Latin1_swedish_ci,
            CharacterSet::Binary => Collation::Binary,
        }
    }
}

impl std::fmt::Display for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf8mb4_0900_bin" => Ok(Collation::Utf8mb4_0900_bin),
            "utf8mb4_0900_ai_ci" => Ok(Collation::Utf8mb4_0900_ai_ci),
            "utf8mb4_general_ci" => Ok(Collation::Utf8mb4_general_ci),
            "latin1_swedish_ci" => Ok(Collation::Latin1_swedish_ci),
            "binary" => Ok(Collation::Binary),
            "utf8mb4" => Ok(Collation::for_character_set(CharacterSet::Utf8mb4)),
            "latin1" => Ok(Collation::for_character_set(CharacterSet::Latin1)),
            _ => Err(format!("Unknown collation: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collation() {
        assert_eq!(
            "LATIN1_SWEDISH_CI".parse::<Collation>(),
            Ok(Collation::Latin1_swedish_ci)
        );
        assert_eq!("latin1".parse::<Collation>(), Ok(Collation::Latin1_swedish_ci));
        assert!("klingon".parse::<Collation>().is_err());
    }

    #[test]
    fn test_character_set() {
        assert_eq!(Collation::default().character_set(), CharacterSet::Utf8mb4);
        assert_eq!(Collation::Latin1_swedish_ci.to_string(), "latin1_swedish_ci");
    }
}
