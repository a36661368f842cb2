//! Read-only situational queries for strategy code
//!
//! A strategy sees the game through `GameStateView` and acts only by
//! submitting the same actions a human client would.

use crate::core::{combat_power, CardCategory, CardId, Keyword, PlayerId};
use crate::effects::{CardLookup, TriggerKind};
use crate::game::combat::{self, check_attack_target, check_attacker};
use crate::game::{GameState, Phase};

/// Read-only view of the game from one player's seat
pub struct GameStateView<'a> {
    state: &'a GameState,
    cards: &'a dyn CardLookup,
    player: PlayerId,
}

impl<'a> GameStateView<'a> {
    pub fn new(state: &'a GameState, cards: &'a dyn CardLookup, player: PlayerId) -> Self {
        GameStateView {
            state,
            cards,
            player,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player
    }

    pub fn opponent_id(&self) -> PlayerId {
        self.state.opponent_of(self.player)
    }

    pub fn state(&self) -> &'a GameState {
        self.state
    }

    /// Is it this player's main phase with nothing pending?
    pub fn can_act_in_main(&self) -> bool {
        self.state.phase == Phase::Main
            && self.state.pending.is_none()
            && self.state.active_player == self.player
    }

    /// Leader and characters that could declare an attack right now
    pub fn ready_attackers(&self) -> Vec<CardId> {
        let Ok(p) = self.state.player(self.player) else {
            return Vec::new();
        };
        p.zones
            .battlers()
            .filter(|id| check_attacker(self.state, self.player, *id).is_ok())
            .collect()
    }

    /// Opponent cards that may be named as an attack target
    pub fn attack_targets(&self) -> Vec<CardId> {
        let Ok(opp) = self.state.player(self.opponent_id()) else {
            return Vec::new();
        };
        opp.zones
            .battlers()
            .filter(|id| check_attack_target(self.state, self.player, *id).is_ok())
            .collect()
    }

    /// Own characters able to block the battle in progress
    ///
    /// Outside a battle, lists the characters that would be able to block.
    pub fn available_blockers(&self) -> Vec<CardId> {
        if let Some(battle) = &self.state.combat {
            if battle.defending_player != self.player {
                return Vec::new();
            }
            return combat::eligible_blockers(self.state, battle);
        }
        let Ok(p) = self.state.player(self.player) else {
            return Vec::new();
        };
        p.zones
            .field
            .cards
            .iter()
            .copied()
            .filter(|id| {
                self.state.card(*id).is_ok_and(|c| {
                    !c.is_rested() && c.has_keyword(&Keyword::Blocker, self.state.turn)
                })
            })
            .collect()
    }

    /// Hand cards playable during the counter step
    ///
    /// Character counters are free; counter events must be affordable with
    /// the active DON on hand.
    pub fn counter_cards(&self) -> Vec<CardId> {
        let Ok(p) = self.state.player(self.player) else {
            return Vec::new();
        };
        let active_don = self
            .state
            .active_don(self.player)
            .map(|d| d.len())
            .unwrap_or(0);
        p.zones
            .hand
            .cards
            .iter()
            .copied()
            .filter(|id| {
                let Ok(card) = self.state.card(*id) else {
                    return false;
                };
                match card.category {
                    CardCategory::Character => card.counter > 0,
                    CardCategory::Event => {
                        self.cards
                            .lookup(card.definition.as_str())
                            .is_some_and(|def| def.has_trigger(&TriggerKind::Counter))
                            && card.effective_cost() as usize <= active_don
                    }
                    _ => false,
                }
            })
            .collect()
    }

    /// Total counter value of the character counters in hand
    pub fn counter_power_in_hand(&self) -> i32 {
        self.counter_cards()
            .into_iter()
            .filter_map(|id| self.state.card(id).ok())
            .filter(|c| c.category == CardCategory::Character)
            .map(|c| c.counter)
            .sum()
    }

    /// Could this turn's ready attackers take the opponent's last life and
    /// finish the game, ignoring blockers and counters?
    ///
    /// Each attacker that beats the opponent leader's power removes one life
    /// card (two with double attack), and one more hit is needed at zero life.
    pub fn can_lethal(&self) -> bool {
        let opponent = self.opponent_id();
        let Ok(opp) = self.state.player(opponent) else {
            return false;
        };
        let Some(leader) = opp.leader() else {
            return false;
        };
        let Ok(leader_power) = self.state.power_of(leader) else {
            return false;
        };
        let turn = self.state.turn;

        let hits_needed = opp.life_count() + 1;
        let mut hits = 0;
        for attacker in self.ready_attackers() {
            let Ok(card) = self.state.card(attacker) else {
                continue;
            };
            let power = self.state.power_of(attacker).unwrap_or(0);
            if combat_power(power) < combat_power(leader_power) {
                continue;
            }
            hits += if card.has_keyword(&Keyword::DoubleAttack, turn) {
                2
            } else {
                1
            };
        }
        hits >= hits_needed
    }
}
