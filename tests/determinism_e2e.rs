//! End-to-end determinism tests
//!
//! Whole games are driven by a fixed policy from a seeded start. Two runs
//! with the same seed must agree on every action and on the final state
//! hash, and replaying the recorded action log from a fresh start must land
//! on the same hash again.
//!
//! One test is generated per `.deck` file in `test_decks/`; each deck plays
//! against itself.

mod common;

use common::{card_db, manifest_path, play_out};
use dir_test::{dir_test, Fixture};
use optcg_forge::game::{
    compute_state_hash, Action, ActionKind, GameEngine, GameSnapshot, GameState, Outcome, Phase,
};
use optcg_forge::history;
use optcg_forge::loader::{CardDatabase, DeckList, DeckLoader, GameInitializer};
use similar_asserts::assert_eq;

const MAX_ACTIONS: usize = 2_000;

fn start(db: &CardDatabase, deck1: &DeckList, deck2: &DeckList, seed: u64) -> GameState {
    GameInitializer::new(db)
        .init_game("Alice", deck1, "Bob", deck2, seed)
        .expect("game initializes")
}

fn run(db: &CardDatabase, deck1: &DeckList, deck2: &DeckList, seed: u64) -> GameState {
    let engine = GameEngine::new(db);
    let mut state = start(db, deck1, deck2, seed);
    play_out(&engine, &mut state, db, MAX_ACTIONS);
    state
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_decks",
    glob: "**/*.deck",
)]
fn test_deck_determinism(fixture: Fixture<&str>) {
    let db = card_db();
    let deck = DeckLoader::parse(fixture.content())
        .unwrap_or_else(|e| panic!("{} does not parse: {e}", fixture.path()));
    let seed = 42u64;

    let run1 = run(&db, &deck, &deck, seed);
    let run2 = run(&db, &deck, &deck, seed);

    assert!(!run1.history.is_empty(), "{} played no actions", fixture.path());
    assert_eq!(run1.history.actions(), run2.history.actions());
    assert_eq!(
        compute_state_hash(&run1),
        compute_state_hash(&run2),
        "{} diverged with seed {seed}",
        fixture.path()
    );
}

#[test]
fn test_opening_sequence() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let red = DeckLoader::load_from_file(&manifest_path("test_decks/red_aggro.deck")).unwrap();
    let mut state = start(&db, &red, &red, 5);
    let [p0, p1] = state.player_ids();

    let begin = Action::new(p0, ActionKind::StartGame { first_player: p0 });
    assert_eq!(engine.apply(&mut state, &begin), Outcome::Completed);
    assert_eq!(state.phase, Phase::StartMulligan);
    for player in [p0, p1] {
        assert_eq!(state.player(player).unwrap().hand_count(), 5);
        assert_eq!(state.player(player).unwrap().life_count(), 0);
    }

    // The first player decides first; the game waits for the second
    let second_keeps = Action::new(p1, ActionKind::KeepHand);
    assert!(!engine.apply(&mut state, &second_keeps).is_accepted());
    let first_keeps = Action::new(p0, ActionKind::KeepHand);
    assert_eq!(engine.apply(&mut state, &first_keeps), Outcome::Completed);
    assert_eq!(state.phase, Phase::StartMulligan);

    let dealt = state.player(p0).unwrap().zones.deck.top(4);
    assert_eq!(engine.apply(&mut state, &second_keeps), Outcome::Completed);
    assert_eq!(state.phase, Phase::Main);
    assert_eq!(state.turn, 1);
    assert_eq!(state.active_player, p0);

    let first = state.player(p0).unwrap();
    // No draw and a single DON on the very first turn
    assert_eq!(first.hand_count(), 5);
    assert_eq!(first.zones.cost_area.len(), 1);
    // The deck's top card sits at the bottom of the life pile
    assert_eq!(first.zones.life.cards, dealt);
    assert_eq!(state.player(p1).unwrap().life_count(), 4);
    assert_eq!(state.player(p1).unwrap().hand_count(), 5);
}

#[test]
fn test_replay_reaches_same_state() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let red = DeckLoader::load_from_file(&manifest_path("test_decks/red_aggro.deck")).unwrap();
    let green = DeckLoader::load_from_file(&manifest_path("test_decks/green_control.deck")).unwrap();

    let played = run(&db, &red, &green, 7);
    let actions: Vec<Action> = played.history.actions();
    assert!(played.turn > 1, "the game never left the first turn");

    let (replayed, outcomes) = history::replay(&engine, start(&db, &red, &green, 7), &actions);
    assert!(outcomes.iter().all(|o| o.is_accepted()));
    assert_eq!(compute_state_hash(&replayed), compute_state_hash(&played));
    assert_eq!(replayed.phase, played.phase);
    assert_eq!(replayed.winner, played.winner);
}

#[test]
fn test_action_log_round_trips_as_json() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let red = DeckLoader::load_from_file(&manifest_path("test_decks/red_aggro.deck")).unwrap();

    let played = run(&db, &red, &red, 11);
    let json = serde_json::to_string(&played.history.actions()).unwrap();
    let actions: Vec<Action> = serde_json::from_str(&json).unwrap();

    let (replayed, _) = history::replay(&engine, start(&db, &red, &red, 11), &actions);
    assert_eq!(compute_state_hash(&replayed), compute_state_hash(&played));
}

#[test]
fn test_different_seeds_differ() {
    let db = card_db();
    let red = DeckLoader::load_from_file(&manifest_path("test_decks/red_aggro.deck")).unwrap();
    let a = start(&db, &red, &red, 1);
    let b = start(&db, &red, &red, 2);
    assert_eq!(a.phase, Phase::StartWaiting);
    assert_ne!(compute_state_hash(&a), compute_state_hash(&b));
}

#[test]
fn test_snapshot_mid_game_resumes_identically() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let red = DeckLoader::load_from_file(&manifest_path("test_decks/red_aggro.deck")).unwrap();
    let green = DeckLoader::load_from_file(&manifest_path("test_decks/green_control.deck")).unwrap();

    let mut state = start(&db, &red, &green, 99);
    play_out(&engine, &mut state, &db, 40);

    let path = std::env::temp_dir().join(format!("optcg_snapshot_{}.json", std::process::id()));
    GameSnapshot::new(state.clone(), Some(99))
        .save_to_file(&path)
        .unwrap();
    let loaded = GameSnapshot::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.seed, Some(99));
    assert_eq!(loaded.action_count(), state.history.len());
    assert_eq!(compute_state_hash(&loaded.game_state), compute_state_hash(&state));

    // Both copies continue to the same end, reshuffles included
    let mut original = state;
    let mut resumed = loaded.game_state;
    play_out(&engine, &mut original, &db, MAX_ACTIONS);
    play_out(&engine, &mut resumed, &db, MAX_ACTIONS);
    assert_eq!(compute_state_hash(&original), compute_state_hash(&resumed));
}
