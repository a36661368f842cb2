//! Save and resume games
//!
//! A snapshot can be taken at any point the engine waits for an action,
//! including in the middle of a pause step: the queue, resume stack and
//! pending effect are all part of `GameState`. The action log travels with
//! it so the game can also be rebuilt from scratch by replay.

use crate::game::{Action, GameState};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// The complete game state at the save point
    pub game_state: GameState,

    /// Turn number when this snapshot was created
    pub turn_number: u32,

    /// Every accepted action since the start of the game
    pub actions: Vec<Action>,

    /// Shuffle seed the game was initialized with, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GameSnapshot {
    /// Snapshot a game, taking the action log from its history
    pub fn new(game_state: GameState, seed: Option<u64>) -> Self {
        GameSnapshot {
            turn_number: game_state.turn,
            actions: game_state.history.actions(),
            game_state,
            seed,
        }
    }

    /// Save this snapshot to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        std::fs::write(path.as_ref(), json).map_err(|e| SnapshotError::Io(e.to_string()))?;

        Ok(())
    }

    /// Load a snapshot from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let json =
            std::fs::read_to_string(path.as_ref()).map_err(|e| SnapshotError::Io(e.to_string()))?;

        let snapshot: GameSnapshot = serde_json::from_str(&json)
            .map_err(|e| SnapshotError::Deserialization(e.to_string()))?;
        snapshot.validate()?;

        Ok(snapshot)
    }

    /// Check that the saved state is internally consistent
    ///
    /// Every card listed in a zone must carry that zone's tag, and a pending
    /// effect must sit in a pause step and belong to an existing player.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let state = &self.game_state;
        for player in state.player_ids() {
            let p = state
                .player(player)
                .map_err(|e| SnapshotError::InvalidState(e.to_string()))?;
            for zone in crate::zones::Zone::ALL {
                for card in &p.zones.get_zone(zone).cards {
                    let tagged = state.card(*card).map(|c| c.zone == zone).unwrap_or(false);
                    if !tagged {
                        return Err(SnapshotError::InvalidState(format!(
                            "card {card} is listed in {zone:?} of player {player} but tagged elsewhere"
                        )));
                    }
                }
            }
        }
        if let Some(pending) = &state.pending {
            if !state.phase.is_pause() {
                return Err(SnapshotError::InvalidState(format!(
                    "pending effect outside a pause step (phase {})",
                    state.phase
                )));
            }
            if state.player(pending.player()).is_err() {
                return Err(SnapshotError::InvalidState(format!(
                    "pending effect waits for unknown player {}",
                    pending.player()
                )));
            }
        }
        Ok(())
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

/// Errors that can occur during snapshot operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialization(String),

    #[error("Failed to deserialize snapshot: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid snapshot state: {0}")]
    InvalidState(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardId, PlayerId};
    use crate::effects::CardDefinition;
    use crate::game::pending::SelectionRequest;
    use crate::game::{compute_state_hash, PendingEffect, Phase, RulesConfig};
    use crate::zones::Zone;

    #[test]
    fn test_snapshot_round_trip_at_pause() {
        let def: CardDefinition = serde_json::from_value(serde_json::json!({
            "id": "C", "name": "Scout", "category": "CHARACTER", "cost": 1, "power": 2000
        }))
        .unwrap();
        let mut state = GameState::new_two_player("s", "A", "B", RulesConfig::default());
        state.seed_rng(99);
        let card = state.create_card(&def, PlayerId::new(0), Zone::Field).unwrap();
        state.pending = Some(PendingEffect::FieldSelect(SelectionRequest {
            source: card,
            player: PlayerId::new(0),
            description: "rest up to 1".to_string(),
            candidates: vec![card],
            min: 0,
            max: 1,
        }));
        state.phase = Phase::FieldSelectStep;

        let snapshot = GameSnapshot::new(state.clone(), Some(99));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();

        assert!(back.validate().is_ok());
        assert_eq!(back.seed, Some(99));
        assert_eq!(back.game_state.pending, state.pending);
        assert_eq!(compute_state_hash(&back.game_state), compute_state_hash(&state));
    }

    #[test]
    fn test_validate_rejects_mistagged_card() {
        let def: CardDefinition = serde_json::from_value(serde_json::json!({
            "id": "C", "name": "Scout", "category": "CHARACTER"
        }))
        .unwrap();
        let mut state = GameState::new_two_player("s", "A", "B", RulesConfig::default());
        let card = state.create_card(&def, PlayerId::new(0), Zone::Hand).unwrap();
        state.card_mut(card).unwrap().zone = Zone::Trash;
        assert_eq!(card, CardId::new(0));

        let snapshot = GameSnapshot::new(state, None);
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::InvalidState(_))
        ));
    }
}
