use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub size: PetSize,
    pub created_at: NaiveDateTime,
}

/// Size category driving the booking price tier. Stored as the single
/// letters used on intake forms: P (pequeno/small), M (medium), G (grande/large).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PetSize {
    #[serde(rename = "P")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "G")]
    Large,
}

impl PetSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetSize::Small => "P",
            PetSize::Medium => "M",
            PetSize::Large => "G",
        }
    }

    /// Unknown values collapse to Medium, so pricing always has a tier.
    pub fn parse(s: &str) -> Self {
        match s {
            "P" => PetSize::Small,
            "G" => PetSize::Large,
            _ => PetSize::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_sizes() {
        assert_eq!(PetSize::parse("P"), PetSize::Small);
        assert_eq!(PetSize::parse("M"), PetSize::Medium);
        assert_eq!(PetSize::parse("G"), PetSize::Large);
    }

    #[test]
    fn test_parse_unknown_defaults_to_medium() {
        assert_eq!(PetSize::parse(""), PetSize::Medium);
        assert_eq!(PetSize::parse("XL"), PetSize::Medium);
        assert_eq!(PetSize::parse("g"), PetSize::Medium);
    }
}
