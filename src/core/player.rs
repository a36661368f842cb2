//! Player representation

use crate::core::{GameEntity, PlayerId, PlayerName};
use crate::zones::PlayerZones;
use serde::{Deserialize, Serialize};

/// Represents a player in the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Unique ID for this player
    pub id: PlayerId,

    /// Player name
    pub name: PlayerName,

    /// All zones owned by this player
    pub zones: PlayerZones,

    /// Has the player lost?
    pub has_lost: bool,

    /// Personal turns started so far (extra turns count)
    pub turns_taken: u32,

    /// Extra turns queued by effects
    pub extra_turns: u32,

    /// Mulligan decision made during setup
    pub mulligan_decided: bool,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>) -> Self {
        PlayerState {
            id,
            name: name.into(),
            zones: PlayerZones::new(id),
            has_lost: false,
            turns_taken: 0,
            extra_turns: 0,
            mulligan_decided: false,
        }
    }

    /// First personal turn: no attacks allowed
    pub fn in_first_turn(&self) -> bool {
        self.turns_taken <= 1
    }

    pub fn life_count(&self) -> usize {
        self.zones.life.len()
    }

    pub fn hand_count(&self) -> usize {
        self.zones.hand.len()
    }

    pub fn deck_count(&self) -> usize {
        self.zones.deck.len()
    }

    /// DON on the field (cost area plus attached)
    pub fn don_on_field(&self) -> usize {
        self.zones.cost_area.len() + self.zones.attached.len()
    }

    pub fn leader(&self) -> Option<crate::core::CardId> {
        self.zones.leader.cards.first().copied()
    }
}

impl GameEntity<PlayerState> for PlayerState {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
