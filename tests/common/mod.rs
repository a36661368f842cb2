//! Shared fixtures for the integration tests
//!
//! `Table` builds a game that is already past setup: both leaders placed,
//! life and decks filled, player 0 in the main phase of turn 3.

#![allow(dead_code)]

use optcg_forge::core::{CardId, PlayerId};
use optcg_forge::game::{
    compute_state_hash, Action, ActionKind, GameEngine, GameState, Outcome, Phase, RulesConfig,
};
use optcg_forge::loader::CardDatabase;
use optcg_forge::zones::Zone;
use std::path::PathBuf;

pub const LEADER: &str = "TS-L01";
pub const VANILLA: &str = "TS-001";

pub fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// Every card under test_cards/
pub fn card_db() -> CardDatabase {
    CardDatabase::load_from_path(&manifest_path("test_cards"), false)
        .expect("test card set loads")
}

pub struct Table {
    pub state: GameState,
    pub p0: PlayerId,
    pub p1: PlayerId,
    pub leaders: [CardId; 2],
}

impl Table {
    /// Player 0 to act in MAIN of turn 3, four life and eight deck cards each
    pub fn new(db: &CardDatabase) -> Self {
        Self::with_config(db, RulesConfig::default())
    }

    pub fn with_config(db: &CardDatabase, config: RulesConfig) -> Self {
        let mut state = GameState::new_two_player("table", "Alice", "Bob", config);
        state.logger.enable_capture();
        state.seed_rng(7);
        let [p0, p1] = state.player_ids();

        let mut leaders = [CardId::new(0); 2];
        for (i, player) in [p0, p1].into_iter().enumerate() {
            let leader = db.get_card(LEADER).expect("leader fixture");
            leaders[i] = state
                .create_card(leader, player, Zone::Leader)
                .expect("leader placed");
        }

        let mut table = Table {
            state,
            p0,
            p1,
            leaders,
        };
        for player in [p0, p1] {
            for _ in 0..8 {
                table.place(db, VANILLA, player, Zone::Deck);
            }
            for _ in 0..4 {
                table.place(db, VANILLA, player, Zone::Life);
            }
        }

        let state = &mut table.state;
        state.first_player = Some(p0);
        state.turn = 3;
        state.active_player = p0;
        state.phase = Phase::Main;
        state.player_mut(p0).unwrap().turns_taken = 2;
        state.player_mut(p1).unwrap().turns_taken = 1;
        for player in [p0, p1] {
            state.player_mut(player).unwrap().mulligan_decided = true;
        }
        state.changes.clear();
        table
    }

    /// Create a card from the database straight into a zone
    pub fn place(&mut self, db: &CardDatabase, id: &str, owner: PlayerId, zone: Zone) -> CardId {
        let def = db.get_card(id).unwrap_or_else(|| panic!("no fixture card {id}"));
        self.state.create_card(def, owner, zone).unwrap()
    }

    /// Put `count` active DON into a player's cost area
    pub fn give_don(&mut self, player: PlayerId, count: usize) {
        for _ in 0..count {
            let don = self.state.create_don(player).unwrap();
            self.state.move_card(don, Zone::CostArea).unwrap();
        }
    }

    /// Empty a player's life pile into the trash, then add `count` plain life cards
    pub fn set_life(&mut self, db: &CardDatabase, player: PlayerId, count: usize) {
        let life = self.state.player(player).unwrap().zones.life.cards.clone();
        for card in life {
            self.state.move_card(card, Zone::Trash).unwrap();
        }
        for _ in 0..count {
            self.place(db, VANILLA, player, Zone::Life);
        }
    }

    pub fn apply(&mut self, engine: &GameEngine<'_>, player: PlayerId, kind: ActionKind) -> Outcome {
        engine.apply(&mut self.state, &Action::new(player, kind))
    }

    pub fn life(&self, player: PlayerId) -> usize {
        self.state.player(player).unwrap().life_count()
    }

    pub fn hand(&self, player: PlayerId) -> usize {
        self.state.player(player).unwrap().hand_count()
    }

    pub fn zone_of(&self, card: CardId) -> Zone {
        self.state.card(card).unwrap().zone
    }

    pub fn hash(&self) -> u64 {
        compute_state_hash(&self.state)
    }
}

pub fn assert_rejected(outcome: &Outcome) {
    assert!(
        matches!(outcome, Outcome::Rejected { .. }),
        "expected a rejection, got {outcome:?}"
    );
}

/// A simple deterministic policy that only uses the public query surface
///
/// Answers every pause by declining, plays the first affordable character,
/// attacks the opposing leader with every ready attacker and then ends the
/// turn. Good enough to drive whole games for determinism checks.
pub fn next_action(state: &GameState, db: &CardDatabase) -> Option<Action> {
    use optcg_forge::core::CardCategory;
    use optcg_forge::game::{AnswerKind, GameStateView};

    if state.is_game_over() {
        return None;
    }
    if let Some(pending) = &state.pending {
        let kind = match pending.answer_kind() {
            AnswerKind::Effect => ActionKind::SkipEffect,
            AnswerKind::Selection => ActionKind::SkipSelection,
            AnswerKind::Cost => ActionKind::SkipAdditionalCost,
            AnswerKind::Choice => ActionKind::DeclineChoice,
            AnswerKind::Trigger => ActionKind::ActivateTrigger,
        };
        return Some(Action::new(pending.player(), kind));
    }

    match state.phase {
        Phase::StartWaiting => {
            let first = state.player_ids()[0];
            Some(Action::new(first, ActionKind::StartGame { first_player: first }))
        }
        Phase::StartMulligan => state
            .player_ids()
            .into_iter()
            .find(|p| !state.player(*p).unwrap().mulligan_decided)
            .map(|p| Action::new(p, ActionKind::KeepHand)),
        Phase::BlockStep => {
            let defender = state.combat.as_ref()?.defending_player;
            Some(Action::new(defender, ActionKind::PassBlock))
        }
        Phase::CounterStep => {
            let defender = state.combat.as_ref()?.defending_player;
            Some(Action::new(defender, ActionKind::PassCounter))
        }
        Phase::Main => {
            let player = state.active_player;
            let view = GameStateView::new(state, db, player);
            if !view.can_act_in_main() {
                return None;
            }
            let me = state.player(player).unwrap();
            let active_don = state.active_don(player).unwrap().len() as i32;
            let field_full = me.zones.field.len() >= state.config.field_limit;

            let playable = me.zones.hand.cards.iter().copied().find(|id| {
                let card = state.card(*id).unwrap();
                card.category == CardCategory::Character
                    && !field_full
                    && card.effective_cost() <= active_don
            });
            if let Some(card) = playable {
                return Some(Action::new(
                    player,
                    ActionKind::PlayCard { card, replace: None },
                ));
            }

            // The opposing leader is always first
            let target = view.attack_targets().first().copied()?;
            if let Some(attacker) = view.ready_attackers().first().copied() {
                return Some(Action::new(
                    player,
                    ActionKind::DeclareAttack { attacker, target },
                ));
            }
            Some(Action::new(player, ActionKind::EndTurn))
        }
        _ => None,
    }
}

/// Drive a game with `next_action` until it ends or `max_actions` were applied
///
/// A rejected proposal during MAIN is followed by an `EndTurn` so the game
/// always makes progress.
pub fn play_out(engine: &GameEngine<'_>, state: &mut GameState, db: &CardDatabase, max_actions: usize) {
    for _ in 0..max_actions {
        let Some(action) = next_action(state, db) else {
            return;
        };
        let outcome = engine.apply(state, &action);
        if !outcome.is_accepted() && state.phase == Phase::Main {
            let end = Action::new(state.active_player, ActionKind::EndTurn);
            engine.apply(state, &end);
        }
    }
}
