//! Buff ledger: tagged power modifiers and effective power
//!
//! Effective power is never stored. It is always derived from the base power,
//! the buffs that are valid at a given (turn, battle) and the attached DON
//! bonus, which only counts during its owner's turn. Raw totals may be
//! negative; clamping to zero happens only at the point of combat comparison.

use crate::core::CardId;
use serde::{Deserialize, Serialize};

/// How long a modifier (buff, keyword grant or restriction) lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Duration {
    /// Until the card leaves the field
    Permanent,
    /// Valid only while `applied_turn` equals the current turn
    #[default]
    ThisTurn,
    /// Valid only while the identified battle is in progress
    ThisBattle,
    /// Owned by the continuous reconciler; cleared and re-derived every pass
    StageContinuous,
}

/// One power modifier on a card instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerBuff {
    pub source: CardId,
    pub value: i32,
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_turn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_battle: Option<u32>,
}

impl PowerBuff {
    /// Build a buff stamped with the turn and battle it was applied in
    pub fn new(
        source: CardId,
        value: i32,
        duration: Duration,
        turn: u32,
        battle: Option<u32>,
    ) -> Self {
        PowerBuff {
            source,
            value,
            duration,
            applied_turn: Some(turn),
            applied_battle: if duration == Duration::ThisBattle {
                battle
            } else {
                None
            },
        }
    }

    /// Is this buff in effect at the given turn / battle?
    pub fn is_valid(&self, turn: u32, active_battle: Option<u32>) -> bool {
        match self.duration {
            Duration::Permanent | Duration::StageContinuous => true,
            Duration::ThisTurn => self.applied_turn == Some(turn),
            Duration::ThisBattle => {
                self.applied_battle.is_some() && self.applied_battle == active_battle
            }
        }
    }
}

/// Sum of the buffs valid at (turn, battle)
pub fn buff_total(buffs: &[PowerBuff], turn: u32, active_battle: Option<u32>) -> i32 {
    buffs
        .iter()
        .filter(|b| b.is_valid(turn, active_battle))
        .map(|b| b.value)
        .sum()
}

/// Raw effective power (may be negative)
///
/// `base + Σ(valid buffs) + (owners_turn ? attached * bonus : 0)`
pub fn effective_power(
    base: i32,
    buffs: &[PowerBuff],
    turn: u32,
    active_battle: Option<u32>,
    attached_don: u32,
    owners_turn: bool,
    don_bonus: i32,
) -> i32 {
    let attachment = if owners_turn {
        attached_don as i32 * don_bonus
    } else {
        0
    };
    base + buff_total(buffs, turn, active_battle) + attachment
}

/// Power as used in a battle comparison
pub fn combat_power(raw: i32) -> i32 {
    raw.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buff(value: i32, duration: Duration, turn: u32, battle: Option<u32>) -> PowerBuff {
        PowerBuff::new(CardId::new(99), value, duration, turn, battle)
    }

    #[test]
    fn test_this_turn_buff_expires_next_turn() {
        let b = buff(2000, Duration::ThisTurn, 3, None);
        assert!(b.is_valid(3, None));
        assert!(!b.is_valid(4, None));
    }

    #[test]
    fn test_battle_buff_requires_same_battle() {
        let b = buff(1000, Duration::ThisBattle, 3, Some(7));
        assert!(b.is_valid(3, Some(7)));
        assert!(!b.is_valid(3, Some(8)));
        assert!(!b.is_valid(3, None));
    }

    #[test]
    fn test_effective_power_formula() {
        let buffs = vec![
            buff(1000, Duration::Permanent, 1, None),
            buff(2000, Duration::ThisTurn, 2, None),
            buff(-500, Duration::ThisTurn, 3, None),
        ];
        // turn 3: permanent + the turn-3 debuff, 2 DON on our turn
        assert_eq!(effective_power(5000, &buffs, 3, None, 2, true, 1000), 7500);
        // DON bonus does not apply on the opponent's turn
        assert_eq!(effective_power(5000, &buffs, 3, None, 2, false, 1000), 5500);
    }

    #[test]
    fn test_effective_power_is_order_independent() {
        let a = buff(1000, Duration::Permanent, 1, None);
        let b = buff(-3000, Duration::ThisTurn, 1, None);
        let c = buff(500, Duration::ThisBattle, 1, Some(1));
        let forward = vec![a.clone(), b.clone(), c.clone()];
        let backward = vec![c, b, a];
        assert_eq!(
            effective_power(2000, &forward, 1, Some(1), 1, true, 1000),
            effective_power(2000, &backward, 1, Some(1), 1, true, 1000)
        );
    }

    #[test]
    fn test_negative_totals_preserved_until_combat() {
        let buffs = vec![buff(-6000, Duration::ThisTurn, 1, None)];
        let raw = effective_power(4000, &buffs, 1, None, 0, true, 1000);
        assert_eq!(raw, -2000);
        assert_eq!(combat_power(raw), 0);
    }
}
