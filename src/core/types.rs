//! Strongly-typed wrappers for game concepts
//!
//! This module provides newtypes to prevent type confusion and make the code
//! more self-documenting. Instead of using bare Strings for different concepts,
//! we wrap them in distinct types that cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static card identifier (print code such as "OP01-001")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(String);

impl DefinitionId {
    pub fn new(s: impl Into<String>) -> Self {
        DefinitionId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DefinitionId {
    fn from(s: &str) -> Self {
        DefinitionId(s.to_string())
    }
}

impl From<String> for DefinitionId {
    fn from(s: String) -> Self {
        DefinitionId(s)
    }
}

/// Card name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ASCII-folded, lowercase form used for name comparisons
    pub fn normalized(&self) -> String {
        normalize_name(&self.0)
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

/// Normalize a card name for matching ("Monkey.D.Luffy" == "monkey.d.luffy")
pub fn normalize_name(name: &str) -> String {
    deunicode::deunicode(name).trim().to_lowercase()
}

/// Player name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        PlayerName(s.to_string())
    }
}

impl From<String> for PlayerName {
    fn from(s: String) -> Self {
        PlayerName(s)
    }
}

/// Card colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Green,
    Blue,
    Purple,
    Black,
    Yellow,
}

impl Color {
    pub fn parse(s: &str) -> Option<Color> {
        match s.to_ascii_uppercase().as_str() {
            "RED" => Some(Color::Red),
            "GREEN" => Some(Color::Green),
            "BLUE" => Some(Color::Blue),
            "PURPLE" => Some(Color::Purple),
            "BLACK" => Some(Color::Black),
            "YELLOW" => Some(Color::Yellow),
            _ => None,
        }
    }
}

/// Card categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardCategory {
    Leader,
    Character,
    Event,
    Stage,
    /// Resource unit; never looked up in the card database
    Don,
}

impl CardCategory {
    pub fn parse(s: &str) -> Option<CardCategory> {
        match s.to_ascii_uppercase().as_str() {
            "LEADER" => Some(CardCategory::Leader),
            "CHARACTER" => Some(CardCategory::Character),
            "EVENT" => Some(CardCategory::Event),
            "STAGE" => Some(CardCategory::Stage),
            "DON" => Some(CardCategory::Don),
            _ => None,
        }
    }
}

/// Numeric comparison used by conditions and filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Comparison {
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    #[default]
    AtMost,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = ">")]
    Greater,
}

impl Comparison {
    pub fn compare(&self, lhs: i32, rhs: i32) -> bool {
        match self {
            Comparison::Less => lhs < rhs,
            Comparison::AtMost => lhs <= rhs,
            Comparison::Equal => lhs == rhs,
            Comparison::AtLeast => lhs >= rhs,
            Comparison::Greater => lhs > rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalization_folds_accents() {
        assert_eq!(normalize_name("Portgas·D·Ace"), normalize_name("portgas·d·ace"));
        assert_eq!(normalize_name("  Nami "), "nami");
        assert_eq!(CardName::new("Zoro").normalized(), "zoro");
    }

    #[test]
    fn test_comparison() {
        assert!(Comparison::AtMost.compare(3, 3));
        assert!(!Comparison::Less.compare(3, 3));
        assert!(Comparison::Greater.compare(5000, 4000));
        let parsed: Comparison = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(parsed, Comparison::AtLeast);
    }

    #[test]
    fn test_category_and_color_parse() {
        assert_eq!(CardCategory::parse("character"), Some(CardCategory::Character));
        assert_eq!(Color::parse("Red"), Some(Color::Red));
        assert_eq!(Color::parse("Pink"), None);
    }
}
