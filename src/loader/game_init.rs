//! Game initialization from decks
//!
//! Creates games from deck lists and the card database. The returned game
//! waits in `StartWaiting`; life and opening hands are dealt by `StartGame`.

use crate::core::{CardCategory, PlayerId};
use crate::game::{GameState, RulesConfig};
use crate::loader::{CardDatabase, DeckList};
use crate::zones::Zone;
use crate::{EngineError, Result};

/// Game builder for initializing games from decks
pub struct GameInitializer<'a> {
    card_db: &'a CardDatabase,
    config: RulesConfig,
}

impl<'a> GameInitializer<'a> {
    /// Create a new game initializer with a card database
    pub fn new(card_db: &'a CardDatabase) -> Self {
        GameInitializer {
            card_db,
            config: RulesConfig::default(),
        }
    }

    pub fn with_config(card_db: &'a CardDatabase, config: RulesConfig) -> Self {
        GameInitializer { card_db, config }
    }

    /// Initialize a two-player game from two decks
    ///
    /// Both decks are shuffled with the seeded game RNG, so the same seed and
    /// deck lists always give the same starting order.
    pub fn init_game(
        &self,
        player1_name: &str,
        player1_deck: &DeckList,
        player2_name: &str,
        player2_deck: &DeckList,
        seed: u64,
    ) -> Result<GameState> {
        let game_id = format!("game-{seed:016x}");
        let mut game =
            GameState::new_two_player(game_id, player1_name, player2_name, self.config.clone());
        game.seed_rng(seed);

        let [player1_id, player2_id] = game.player_ids();
        self.load_deck_into_game(&mut game, player1_id, player1_deck)?;
        self.load_deck_into_game(&mut game, player2_id, player2_deck)?;

        for player in [player1_id, player2_id] {
            for _ in 0..self.config.don_deck_size {
                game.create_don(player)?;
            }
            game.shuffle_deck(player)?;
        }
        game.changes.clear();

        Ok(game)
    }

    /// Place the leader and fill the player's deck
    fn load_deck_into_game(
        &self,
        game: &mut GameState,
        player_id: PlayerId,
        deck: &DeckList,
    ) -> Result<()> {
        let leader = self.card_db.get_card(&deck.leader).ok_or_else(|| {
            EngineError::InvalidDeckFormat(format!("Card not found: {}", deck.leader))
        })?;
        if leader.category != CardCategory::Leader {
            return Err(EngineError::InvalidDeckFormat(format!(
                "{} is not a leader",
                deck.leader
            )));
        }
        game.create_card(leader, player_id, Zone::Leader)?;

        for entry in &deck.main_deck {
            let card_def = self.card_db.get_card(&entry.card_id).ok_or_else(|| {
                EngineError::InvalidDeckFormat(format!("Card not found: {}", entry.card_id))
            })?;
            if matches!(card_def.category, CardCategory::Leader | CardCategory::Don) {
                return Err(EngineError::InvalidDeckFormat(format!(
                    "{} cannot be in the main deck",
                    entry.card_id
                )));
            }
            for _ in 0..entry.count {
                game.create_card(card_def, player_id, Zone::Deck)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::compute_state_hash;
    use crate::loader::DeckLoader;

    fn card_db() -> CardDatabase {
        let cards = CardDatabase::parse_str(
            r#"[
                {"id": "L-01", "name": "Captain", "category": "LEADER", "power": 5000, "life": 4},
                {"id": "C-01", "name": "Deckhand", "category": "CHARACTER", "cost": 1, "power": 2000, "counter": 1000},
                {"id": "C-02", "name": "Gunner", "category": "CHARACTER", "cost": 3, "power": 4000}
            ]"#,
        )
        .unwrap();
        CardDatabase::from_definitions(cards).unwrap()
    }

    fn deck() -> DeckList {
        DeckLoader::parse("[Leader]\n1 L-01\n[Main]\n10 C-01\n10 C-02\n").unwrap()
    }

    #[test]
    fn test_init_simple_game() {
        let db = card_db();
        let game = GameInitializer::new(&db)
            .init_game("Alice", &deck(), "Bob", &deck(), 7)
            .unwrap();

        for player in game.player_ids() {
            let p = game.player(player).unwrap();
            assert_eq!(p.deck_count(), 20);
            assert!(p.leader().is_some());
            assert_eq!(p.zones.don_deck.len(), 10);
            assert_eq!(p.hand_count(), 0);
        }
        // 2 leaders, 40 deck cards, 20 DON
        assert_eq!(game.cards.len(), 62);
    }

    #[test]
    fn test_same_seed_same_order() {
        let db = card_db();
        let init = GameInitializer::new(&db);
        let a = init.init_game("A", &deck(), "B", &deck(), 42).unwrap();
        let b = init.init_game("A", &deck(), "B", &deck(), 42).unwrap();
        let c = init.init_game("A", &deck(), "B", &deck(), 43).unwrap();
        assert_eq!(compute_state_hash(&a), compute_state_hash(&b));
        let p0 = a.player_ids()[0];
        assert_ne!(
            a.player(p0).unwrap().zones.deck.cards,
            c.player(p0).unwrap().zones.deck.cards
        );
    }

    #[test]
    fn test_missing_card_error() {
        let db = card_db();
        let bad = DeckLoader::parse("[Leader]\n1 L-01\n[Main]\n4 NOPE-1\n").unwrap();
        let err = GameInitializer::new(&db)
            .init_game("A", &bad, "B", &deck(), 1)
            .unwrap_err();
        assert!(err.to_string().contains("NOPE-1"));
    }

    #[test]
    fn test_leader_placement_checked() {
        let db = card_db();
        let not_leader = DeckLoader::parse("[Leader]\n1 C-01\n[Main]\n4 C-02\n").unwrap();
        assert!(GameInitializer::new(&db)
            .init_game("A", &not_leader, "B", &deck(), 1)
            .is_err());
        let leader_in_main = DeckLoader::parse("[Leader]\n1 L-01\n[Main]\n1 L-01\n").unwrap();
        assert!(GameInitializer::new(&db)
            .init_game("A", &leader_in_main, "B", &deck(), 1)
            .is_err());
    }
}
