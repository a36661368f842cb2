//! Runtime card instances
//!
//! A `GameCard` is one physical card during a game. Static rules text lives in
//! the card database and is looked up through `definition`; the fields copied
//! here are the ones the engine mutates or reads on every power/cost query.

use crate::core::buff::{self, Duration, PowerBuff};
use crate::core::{CardCategory, CardId, CardName, DefinitionId, GameEntity, Keyword, PlayerId};
use crate::zones::Zone;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Orientation of a card on the field (DON in the cost area use it too)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardState {
    #[default]
    Active,
    Rested,
}

/// Restrictions and immunities placed on a card by effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionKind {
    CannotAttack,
    /// Cannot be K.O.'d by battle or by effects
    ImmuneToKo,
    /// Cannot be K.O.'d in battle
    ImmuneToBattleKo,
}

/// A restriction tagged with its source and expiry rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub kind: RestrictionKind,
    pub source: CardId,
    pub duration: Duration,
    pub applied_turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_battle: Option<u32>,
}

impl Restriction {
    pub fn is_in_effect(&self, turn: u32, active_battle: Option<u32>) -> bool {
        match self.duration {
            Duration::Permanent | Duration::StageContinuous => true,
            Duration::ThisTurn => self.applied_turn == turn,
            Duration::ThisBattle => {
                self.applied_battle.is_some() && self.applied_battle == active_battle
            }
        }
    }
}

/// A keyword granted by an effect for a limited time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGrant {
    pub keyword: Keyword,
    pub duration: Duration,
    pub applied_turn: u32,
}

/// A card instance in the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameCard {
    pub id: CardId,
    pub definition: DefinitionId,
    pub name: CardName,
    pub category: CardCategory,
    pub owner: PlayerId,

    /// Zone tag, kept in sync by `GameState::move_card`
    pub zone: Zone,
    pub state: CardState,
    pub face_up: bool,

    /// For DON: the leader/character it is attached to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_to: Option<CardId>,

    pub base_power: i32,
    /// Printed power cached while a "set base power" effect is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_base_power: Option<i32>,
    pub base_cost: i32,
    pub counter: i32,

    pub buffs: SmallVec<[PowerBuff; 2]>,
    pub base_keywords: SmallVec<[Keyword; 2]>,
    /// Turn-scoped and permanent grants from effects
    pub granted_keywords: SmallVec<[KeywordGrant; 1]>,
    /// Battle-scoped grants
    pub temporary_keywords: SmallVec<[Keyword; 1]>,
    /// Re-derived by the continuous reconciler
    pub continuous_keywords: SmallVec<[Keyword; 1]>,
    pub restrictions: SmallVec<[Restriction; 1]>,

    /// Continuous cost modifier (re-derived by the reconciler)
    pub cost_modifier: i32,

    /// Turn this card entered the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub played_turn: Option<u32>,

    /// Indices of once-per-turn abilities already used this turn
    pub used_abilities: SmallVec<[usize; 2]>,
}

impl GameCard {
    pub fn new(
        id: CardId,
        definition: DefinitionId,
        name: CardName,
        category: CardCategory,
        owner: PlayerId,
        zone: Zone,
    ) -> Self {
        GameCard {
            id,
            definition,
            name,
            category,
            owner,
            zone,
            state: CardState::Active,
            face_up: false,
            attached_to: None,
            base_power: 0,
            original_base_power: None,
            base_cost: 0,
            counter: 0,
            buffs: SmallVec::new(),
            base_keywords: SmallVec::new(),
            granted_keywords: SmallVec::new(),
            temporary_keywords: SmallVec::new(),
            continuous_keywords: SmallVec::new(),
            restrictions: SmallVec::new(),
            cost_modifier: 0,
            played_turn: None,
            used_abilities: SmallVec::new(),
        }
    }

    pub fn is_rested(&self) -> bool {
        self.state == CardState::Rested
    }

    pub fn rest(&mut self) {
        self.state = CardState::Rested;
    }

    pub fn set_active(&mut self) {
        self.state = CardState::Active;
    }

    pub fn has_keyword(&self, keyword: &Keyword, turn: u32) -> bool {
        self.base_keywords.contains(keyword)
            || self.temporary_keywords.contains(keyword)
            || self.continuous_keywords.contains(keyword)
            || self.granted_keywords.iter().any(|g| {
                &g.keyword == keyword
                    && (g.duration != Duration::ThisTurn || g.applied_turn == turn)
            })
    }

    pub fn has_restriction(&self, kind: RestrictionKind, turn: u32, battle: Option<u32>) -> bool {
        self.restrictions
            .iter()
            .any(|r| r.kind == kind && r.is_in_effect(turn, battle))
    }

    /// Raw effective power, see `buff::effective_power`
    pub fn effective_power(
        &self,
        turn: u32,
        battle: Option<u32>,
        attached_don: u32,
        owners_turn: bool,
        don_bonus: i32,
    ) -> i32 {
        buff::effective_power(
            self.base_power,
            &self.buffs,
            turn,
            battle,
            attached_don,
            owners_turn,
            don_bonus,
        )
    }

    /// Cost after continuous modifiers, never below zero
    pub fn effective_cost(&self) -> i32 {
        (self.base_cost + self.cost_modifier).max(0)
    }

    /// Replace base power, caching the printed value for turn-end restoration
    pub fn set_base_power(&mut self, value: i32) {
        if self.original_base_power.is_none() {
            self.original_base_power = Some(self.base_power);
        }
        self.base_power = value;
    }

    pub fn restore_base_power(&mut self) {
        if let Some(original) = self.original_base_power.take() {
            self.base_power = original;
        }
    }

    /// Drop everything that only lives while the card is on the field
    pub fn reset_field_state(&mut self) {
        self.restore_base_power();
        self.state = CardState::Active;
        self.attached_to = None;
        self.buffs.clear();
        self.granted_keywords.clear();
        self.temporary_keywords.clear();
        self.continuous_keywords.clear();
        self.restrictions.clear();
        self.played_turn = None;
        self.used_abilities.clear();
    }

    /// Clear battle-scoped buffs, keywords and restrictions
    pub fn clear_battle_effects(&mut self) {
        self.buffs.retain(|b| b.duration != Duration::ThisBattle);
        self.temporary_keywords.clear();
        self.restrictions.retain(|r| r.duration != Duration::ThisBattle);
    }

    /// Clear turn-scoped buffs, keywords, restrictions and once-per-turn flags
    pub fn clear_turn_effects(&mut self) {
        self.buffs.retain(|b| b.duration != Duration::ThisTurn);
        self.granted_keywords.retain(|g| g.duration != Duration::ThisTurn);
        self.restrictions.retain(|r| r.duration != Duration::ThisTurn);
        self.used_abilities.clear();
        self.restore_base_power();
    }

    /// Baseline for the continuous reconciler
    pub fn clear_continuous(&mut self) {
        self.buffs.retain(|b| b.duration != Duration::StageContinuous);
        self.continuous_keywords.clear();
        self.restrictions
            .retain(|r| r.duration != Duration::StageContinuous);
        self.cost_modifier = 0;
    }
}

impl GameEntity<GameCard> for GameCard {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(power: i32) -> GameCard {
        let mut card = GameCard::new(
            CardId::new(1),
            DefinitionId::from("ST01-004"),
            CardName::from("Sanji"),
            CardCategory::Character,
            PlayerId::new(0),
            Zone::Field,
        );
        card.base_power = power;
        card
    }

    #[test]
    fn test_set_base_power_caches_original_once() {
        let mut card = character(4000);
        card.set_base_power(7000);
        card.set_base_power(0);
        assert_eq!(card.base_power, 0);
        card.clear_turn_effects();
        assert_eq!(card.base_power, 4000);
        assert_eq!(card.original_base_power, None);
    }

    #[test]
    fn test_turn_keyword_grant_expires() {
        let mut card = character(3000);
        card.granted_keywords.push(KeywordGrant {
            keyword: Keyword::Rush,
            duration: Duration::ThisTurn,
            applied_turn: 2,
        });
        assert!(card.has_keyword(&Keyword::Rush, 2));
        assert!(!card.has_keyword(&Keyword::Rush, 3));
    }

    #[test]
    fn test_clear_battle_effects_keeps_turn_buffs() {
        let mut card = character(3000);
        card.buffs
            .push(PowerBuff::new(CardId::new(5), 1000, Duration::ThisBattle, 1, Some(1)));
        card.buffs
            .push(PowerBuff::new(CardId::new(5), 2000, Duration::ThisTurn, 1, None));
        card.temporary_keywords.push(Keyword::DoubleAttack);
        card.clear_battle_effects();
        assert_eq!(card.buffs.len(), 1);
        assert_eq!(card.buffs[0].value, 2000);
        assert!(card.temporary_keywords.is_empty());
    }

    #[test]
    fn test_effective_cost_never_negative() {
        let mut card = character(3000);
        card.base_cost = 2;
        card.cost_modifier = -3;
        assert_eq!(card.effective_cost(), 0);
    }
}
