//! Main game state structure

use crate::core::{
    CardCategory, CardId, CardName, DefinitionId, EntityStore, GameCard, PlayerId,
    PlayerState,
};
use crate::effects::CardDefinition;
use crate::game::{
    CombatInfo, GameLogger, Outcome, PendingEffect, Phase, QueuedAbility, ResumePoint,
    RulesConfig,
};
use crate::history::{HistoryLog, StateChange};
use crate::zones::Zone;
use crate::{EngineError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Definition id used by every DON card instance
pub const DON_DEFINITION: &str = "DON";

/// Complete state of one game
///
/// Mutated only through the engine's validated actions. Everything in here,
/// including the effect queue and any pending pause, is serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: String,

    /// Arena of every card instance in the game
    pub cards: EntityStore<GameCard>,

    /// Exactly two players, ids 0 and 1
    pub players: EntityStore<PlayerState>,

    pub phase: Phase,

    /// Global turn counter (0 before the first turn starts)
    pub turn: u32,

    pub active_player: PlayerId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_player: Option<PlayerId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combat: Option<CombatInfo>,

    /// At most one blocking question at a time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingEffect>,

    /// Matched abilities waiting to resolve, front first
    #[serde(default)]
    pub queue: VecDeque<QueuedAbility>,

    /// Continuations to run once the queue is empty, top last
    #[serde(default)]
    pub resume: Vec<ResumePoint>,

    pub next_battle_id: u32,

    pub config: RulesConfig,

    /// Game RNG; its current state is part of the snapshot so reshuffles replay
    pub rng: RefCell<ChaCha12Rng>,

    /// Changes produced by the action currently being applied
    #[serde(skip)]
    pub changes: Vec<StateChange>,

    pub history: HistoryLog,

    pub logger: GameLogger,
}

impl GameState {
    /// Create an empty two-player game waiting for `StartGame`
    pub fn new_two_player(
        game_id: impl Into<String>,
        player1_name: &str,
        player2_name: &str,
        config: RulesConfig,
    ) -> Self {
        let mut players = EntityStore::new();
        let p1 = players.insert_with(|id| PlayerState::new(id, player1_name));
        players.insert_with(|id| PlayerState::new(id, player2_name));

        GameState {
            game_id: game_id.into(),
            cards: EntityStore::new(),
            players,
            phase: Phase::StartWaiting,
            turn: 0,
            active_player: p1,
            first_player: None,
            winner: None,
            combat: None,
            pending: None,
            queue: VecDeque::new(),
            resume: Vec::new(),
            next_battle_id: 1,
            config,
            rng: RefCell::new(ChaCha12Rng::seed_from_u64(0)),
            changes: Vec::new(),
            history: HistoryLog::new(),
            logger: GameLogger::new(),
        }
    }

    /// Set the RNG seed for deterministic gameplay
    pub fn seed_rng(&mut self, seed: u64) {
        *self.rng.borrow_mut() = ChaCha12Rng::seed_from_u64(seed);
    }

    pub fn record(&mut self, change: StateChange) {
        self.changes.push(change);
    }

    pub fn player_ids(&self) -> [PlayerId; 2] {
        [PlayerId::new(0), PlayerId::new(1)]
    }

    pub fn player(&self, id: PlayerId) -> Result<&PlayerState> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut PlayerState> {
        self.players.get_mut(id)
    }

    /// The other player of a two-player game
    pub fn opponent_of(&self, id: PlayerId) -> PlayerId {
        PlayerId::new(1 - id.as_u32().min(1))
    }

    pub fn card(&self, id: CardId) -> Result<&GameCard> {
        self.cards.get(id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Result<&mut GameCard> {
        self.cards.get_mut(id)
    }

    pub fn is_game_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            let from = self.phase;
            self.phase = phase;
            self.record(StateChange::PhaseChanged { from, to: phase });
        }
    }

    /// Instantiate a card from its definition into `zone`
    pub fn create_card(&mut self, def: &CardDefinition, owner: PlayerId, zone: Zone) -> Result<CardId> {
        let id = self.cards.insert_with(|id| {
            let mut card = GameCard::new(
                id,
                def.id.clone(),
                def.name.clone(),
                def.category,
                owner,
                zone,
            );
            card.base_power = def.power;
            card.base_cost = def.cost;
            card.counter = def.counter;
            card.base_keywords = def.keywords.iter().cloned().collect();
            card.face_up = zone.is_public();
            card
        });
        self.player_mut(owner)?.zones.get_zone_mut(zone).add(id);
        Ok(id)
    }

    /// Instantiate one DON card into the owner's DON deck
    pub fn create_don(&mut self, owner: PlayerId) -> Result<CardId> {
        let id = self.cards.insert_with(|id| {
            GameCard::new(
                id,
                DefinitionId::from(DON_DEFINITION),
                CardName::from("DON!!"),
                CardCategory::Don,
                owner,
                Zone::DonDeck,
            )
        });
        self.player_mut(owner)?.zones.don_deck.add(id);
        Ok(id)
    }

    fn detach_from_zone(&mut self, card_id: CardId) -> Result<(PlayerId, Zone)> {
        let (owner, from) = {
            let card = self.card(card_id)?;
            (card.owner, card.zone)
        };
        if !self.player_mut(owner)?.zones.get_zone_mut(from).remove(card_id) {
            return Err(EngineError::IllegalAction(format!(
                "card {card_id} not found in its zone {from:?}"
            )));
        }
        Ok((owner, from))
    }

    fn place(&mut self, card_id: CardId, owner: PlayerId, from: Zone, to: Zone, bottom: bool) -> Result<()> {
        let leaves_play = matches!(from, Zone::Field | Zone::Stage | Zone::Leader)
            && !matches!(to, Zone::Field | Zone::Stage | Zone::Leader);
        if leaves_play {
            self.return_attached_don(card_id)?;
        }

        {
            let card = self.card_mut(card_id)?;
            if leaves_play || to == Zone::DonDeck {
                card.reset_field_state();
            }
            card.zone = to;
            card.face_up = to.is_public();
            if to != Zone::Attached {
                card.attached_to = None;
            }
        }

        let zone = self.player_mut(owner)?.zones.get_zone_mut(to);
        if bottom {
            zone.add_to_bottom(card_id);
        } else {
            zone.add(card_id);
        }

        self.record(StateChange::CardMoved {
            card: card_id,
            owner,
            from,
            to,
        });
        Ok(())
    }

    /// Move a card to the top (end) of a zone of its owner
    ///
    /// This is the only way a card's zone tag changes. Leaving the field drops
    /// every field-only modifier and sends attached DON back rested.
    pub fn move_card(&mut self, card_id: CardId, to: Zone) -> Result<()> {
        let (owner, from) = self.detach_from_zone(card_id)?;
        self.place(card_id, owner, from, to, false)
    }

    /// Move a card to the bottom of a zone (deck bottom)
    pub fn move_card_to_bottom(&mut self, card_id: CardId, to: Zone) -> Result<()> {
        let (owner, from) = self.detach_from_zone(card_id)?;
        self.place(card_id, owner, from, to, true)
    }

    /// Draw the top card of a player's deck; `None` when the deck is empty
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<Option<CardId>> {
        match self.player(player_id)?.zones.deck.peek_top() {
            Some(card_id) => {
                self.move_card(card_id, Zone::Hand)?;
                Ok(Some(card_id))
            }
            None => Ok(None),
        }
    }

    /// Shuffle a player's deck using the game's RNG
    pub fn shuffle_deck(&mut self, player_id: PlayerId) -> Result<()> {
        let mut rng = self.rng.borrow_mut();
        self.players
            .get_mut(player_id)?
            .zones
            .deck
            .shuffle(&mut *rng);
        Ok(())
    }

    pub fn rest_card(&mut self, card_id: CardId) -> Result<()> {
        let card = self.card_mut(card_id)?;
        if !card.is_rested() {
            card.rest();
            self.record(StateChange::CardRested { card: card_id });
        }
        Ok(())
    }

    pub fn activate_card(&mut self, card_id: CardId) -> Result<()> {
        let card = self.card_mut(card_id)?;
        if card.is_rested() {
            card.set_active();
            self.record(StateChange::CardActivated { card: card_id });
        }
        Ok(())
    }

    /// Active DON in a player's cost area
    pub fn active_don(&self, player_id: PlayerId) -> Result<Vec<CardId>> {
        let player = self.player(player_id)?;
        Ok(player
            .zones
            .cost_area
            .cards
            .iter()
            .copied()
            .filter(|id| self.card(*id).map(|c| !c.is_rested()).unwrap_or(false))
            .collect())
    }

    /// Number of DON attached to a card
    pub fn attached_don(&self, card_id: CardId) -> u32 {
        self.attached_don_cards(card_id).len() as u32
    }

    pub fn attached_don_cards(&self, card_id: CardId) -> Vec<CardId> {
        let Ok(owner) = self.card(card_id).map(|c| c.owner) else {
            return Vec::new();
        };
        let Ok(player) = self.player(owner) else {
            return Vec::new();
        };
        player
            .zones
            .attached
            .cards
            .iter()
            .copied()
            .filter(|don| {
                self.card(*don)
                    .map(|d| d.attached_to == Some(card_id))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Attach a DON from the cost area to a leader or character
    pub fn attach_don(&mut self, don: CardId, target: CardId) -> Result<()> {
        self.move_card(don, Zone::Attached)?;
        self.card_mut(don)?.attached_to = Some(target);
        self.record(StateChange::DonAttached { don, target });
        Ok(())
    }

    /// Send DON attached to `card_id` back to its owner's cost area, rested
    pub fn return_attached_don(&mut self, card_id: CardId) -> Result<()> {
        for don in self.attached_don_cards(card_id) {
            self.move_card(don, Zone::CostArea)?;
            self.card_mut(don)?.rest();
        }
        Ok(())
    }

    /// The battle currently in progress
    pub fn active_battle(&self) -> Option<u32> {
        self.combat.as_ref().map(|c| c.battle_id)
    }

    /// Raw effective power of a card (may be negative)
    pub fn power_of(&self, card_id: CardId) -> Result<i32> {
        let card = self.card(card_id)?;
        Ok(card.effective_power(
            self.turn,
            self.active_battle(),
            self.attached_don(card_id),
            card.owner == self.active_player,
            self.config.don_power_bonus,
        ))
    }

    /// Mark a player as having lost and end the game
    pub fn player_loses(&mut self, loser: PlayerId) -> Result<()> {
        self.player_mut(loser)?.has_lost = true;
        self.record(StateChange::PlayerLost { player: loser });
        let winner = self.opponent_of(loser);
        self.winner = Some(winner);
        self.pending = None;
        self.queue.clear();
        self.resume.clear();
        self.set_phase(Phase::GameOver);
        self.logger.minimal(&format!(
            "{} wins the game",
            self.player(winner)?.name.as_str()
        ));
        Ok(())
    }

    /// Outcome describing the state the game is now waiting in
    pub fn outcome(&self) -> Outcome {
        if self.is_game_over() {
            Outcome::GameOver {
                winner: self.winner,
            }
        } else if let Some(pending) = &self.pending {
            Outcome::Paused {
                phase: self.phase,
                player: pending.player(),
            }
        } else {
            Outcome::Completed
        }
    }

    /// Is a card in play (leader, field or stage)?
    pub fn in_play(&self, card_id: CardId) -> bool {
        self.card(card_id)
            .map(|c| matches!(c.zone, Zone::Leader | Zone::Field | Zone::Stage))
            .unwrap_or(false)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Keyword;

    fn definition(id: &str, category: CardCategory, power: i32) -> CardDefinition {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": id,
            "category": category,
            "power": power,
            "cost": 2,
            "life": 4,
            "keywords": ["BLOCKER"],
        }))
        .unwrap()
    }

    fn new_state() -> GameState {
        let mut state = GameState::new_two_player("t", "Alice", "Bob", RulesConfig::default());
        state.logger.enable_capture();
        state
    }

    #[test]
    fn test_create_and_move_card() {
        let mut state = new_state();
        let p0 = PlayerId::new(0);
        let def = definition("C-1", CardCategory::Character, 4000);
        let card = state.create_card(&def, p0, Zone::Hand).unwrap();

        assert_eq!(state.card(card).unwrap().base_power, 4000);
        assert!(state.card(card).unwrap().base_keywords.contains(&Keyword::Blocker));

        state.move_card(card, Zone::Field).unwrap();
        assert_eq!(state.card(card).unwrap().zone, Zone::Field);
        assert!(state.player(p0).unwrap().zones.field.contains(card));
        assert!(!state.player(p0).unwrap().zones.hand.contains(card));
        assert_eq!(state.changes.len(), 1);
    }

    #[test]
    fn test_leaving_field_returns_attached_don_rested() {
        let mut state = new_state();
        let p0 = PlayerId::new(0);
        let def = definition("C-1", CardCategory::Character, 3000);
        let card = state.create_card(&def, p0, Zone::Field).unwrap();
        let don = state.create_don(p0).unwrap();
        state.move_card(don, Zone::CostArea).unwrap();
        state.attach_don(don, card).unwrap();

        state.active_player = p0;
        assert_eq!(state.attached_don(card), 1);
        assert_eq!(state.power_of(card).unwrap(), 4000);

        state.move_card(card, Zone::Trash).unwrap();
        let don_card = state.card(don).unwrap();
        assert_eq!(don_card.zone, Zone::CostArea);
        assert!(don_card.is_rested());
        assert_eq!(don_card.attached_to, None);
    }

    #[test]
    fn test_don_bonus_only_on_owners_turn() {
        let mut state = new_state();
        let p0 = PlayerId::new(0);
        let def = definition("L-1", CardCategory::Leader, 5000);
        let leader = state.create_card(&def, p0, Zone::Leader).unwrap();
        let don = state.create_don(p0).unwrap();
        state.move_card(don, Zone::CostArea).unwrap();
        state.attach_don(don, leader).unwrap();

        state.active_player = p0;
        assert_eq!(state.power_of(leader).unwrap(), 6000);
        state.active_player = PlayerId::new(1);
        assert_eq!(state.power_of(leader).unwrap(), 5000);
    }

    #[test]
    fn test_draw_from_empty_deck() {
        let mut state = new_state();
        assert_eq!(state.draw_card(PlayerId::new(0)).unwrap(), None);
    }

    #[test]
    fn test_opponent_of() {
        let state = new_state();
        assert_eq!(state.opponent_of(PlayerId::new(0)), PlayerId::new(1));
        assert_eq!(state.opponent_of(PlayerId::new(1)), PlayerId::new(0));
    }
}
