//! Rules constants
//!
//! Every field has a default so a partial JSON file (or `{}`) is a valid
//! configuration.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Cards drawn for the opening hand
    pub starting_hand: usize,
    /// Maximum characters on a player's field
    pub field_limit: usize,
    /// DON cards in each player's DON deck
    pub don_deck_size: usize,
    /// DON added during each resource phase
    pub don_per_turn: usize,
    /// DON added during the very first turn of the game
    pub first_turn_don: usize,
    /// Power granted per attached DON on the owner's turn
    pub don_power_bonus: i32,
    /// Maximum nesting of "then" child actions
    pub max_effect_depth: u8,
    /// Reject cards carrying unknown rule keywords at load time
    pub strict_keywords: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            starting_hand: 5,
            field_limit: 5,
            don_deck_size: 10,
            don_per_turn: 2,
            first_turn_don: 1,
            don_power_bonus: 1000,
            max_effect_depth: 3,
            strict_keywords: false,
        }
    }
}

impl RulesConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}
