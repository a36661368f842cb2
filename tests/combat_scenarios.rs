//! Battle flow tests: damage, counters, blockers, double attack and life triggers

mod common;

use common::{assert_rejected, card_db, Table};
use optcg_forge::game::{ActionKind, GameEngine, Outcome, Phase, TargetType};
use optcg_forge::zones::Zone;
use similar_asserts::assert_eq;

#[test]
fn test_unanswered_attack_takes_one_life() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let attacker = t.place(&db, "TS-003", p0, Zone::Field);
    let target = t.leaders[1];

    let outcome = t.apply(&engine, p0, ActionKind::DeclareAttack { attacker, target });
    assert_eq!(outcome, Outcome::Completed);
    // No blockers on the defending side: straight to the counter step
    assert_eq!(t.state.phase, Phase::CounterStep);
    assert!(t.state.card(attacker).unwrap().is_rested());

    assert_rejected(&t.apply(&engine, p0, ActionKind::PassCounter));
    assert_eq!(t.apply(&engine, p1, ActionKind::PassCounter), Outcome::Completed);

    assert_eq!(t.life(p1), 3);
    assert_eq!(t.hand(p1), 1);
    assert_eq!(t.state.phase, Phase::Main);
    assert!(t.state.combat.is_none());
}

#[test]
fn test_two_counters_stop_the_attack() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let attacker = t.place(&db, "TS-004", p0, Zone::Field);
    let small = t.place(&db, "TS-001", p1, Zone::Hand);
    let big = t.place(&db, "TS-002", p1, Zone::Hand);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker, target });
    assert_eq!(t.apply(&engine, p1, ActionKind::PlayCounter { card: small }), Outcome::Completed);
    assert_eq!(t.state.phase, Phase::CounterStep);
    t.apply(&engine, p1, ActionKind::PlayCounter { card: big });
    assert_eq!(t.state.combat.as_ref().unwrap().counter_power, 3000);

    t.apply(&engine, p1, ActionKind::PassCounter);
    // 7000 against 5000 + 3000
    assert_eq!(t.life(p1), 4);
    assert_eq!(t.zone_of(small), Zone::Trash);
    assert_eq!(t.zone_of(big), Zone::Trash);
    assert_eq!(t.state.phase, Phase::Main);
}

#[test]
fn test_empty_deck_at_draw_loses() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let deck = t.state.player(p1).unwrap().zones.deck.cards.clone();
    for card in deck {
        t.state.move_card(card, Zone::Trash).unwrap();
    }

    let outcome = t.apply(&engine, p0, ActionKind::EndTurn);
    assert_eq!(outcome, Outcome::GameOver { winner: Some(p0) });
    assert_eq!(t.state.phase, Phase::GameOver);
    assert!(t.state.player(p1).unwrap().has_lost);

    assert_rejected(&t.apply(&engine, p1, ActionKind::EndTurn));
}

#[test]
fn test_double_attack_at_one_life_takes_one() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    t.set_life(&db, p1, 1);
    let twin = t.place(&db, "TS-005", p0, Zone::Field);
    let brawler = t.place(&db, "TS-003", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: twin, target });
    let outcome = t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(t.life(p1), 0);
    assert_eq!(t.state.phase, Phase::Main);

    // The next hit at zero life ends the game
    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: brawler, target });
    let outcome = t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(outcome, Outcome::GameOver { winner: Some(p0) });
}

#[test]
fn test_double_attack_takes_two() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let twin = t.place(&db, "TS-005", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: twin, target });
    t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(t.life(p1), 2);
    assert_eq!(t.hand(p1), 2);
}

#[test]
fn test_life_trigger_pauses_damage() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    t.set_life(&db, p1, 2);
    let lookout = t.place(&db, "TS-008", p1, Zone::Life);
    let twin = t.place(&db, "TS-005", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: twin, target });
    let outcome = t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(
        outcome,
        Outcome::Paused {
            phase: Phase::TriggerStep,
            player: p1
        }
    );
    assert!(t.state.card(lookout).unwrap().face_up);
    assert_eq!(t.state.combat.as_ref().unwrap().remaining_damage, 1);

    assert_rejected(&t.apply(&engine, p0, ActionKind::ActivateTrigger));
    assert_rejected(&t.apply(&engine, p1, ActionKind::PassCounter));

    let outcome = t.apply(&engine, p1, ActionKind::ActivateTrigger);
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(t.zone_of(lookout), Zone::Trash);
    // One card drawn by the trigger, one life card from the second damage
    assert_eq!(t.hand(p1), 2);
    assert_eq!(t.life(p1), 1);
    assert_eq!(t.state.phase, Phase::Main);
    assert!(t.state.combat.is_none());
}

#[test]
fn test_skipped_trigger_goes_to_hand() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let lookout = t.place(&db, "TS-008", p1, Zone::Life);
    let brawler = t.place(&db, "TS-003", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: brawler, target });
    t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(t.state.phase, Phase::TriggerStep);

    t.apply(&engine, p1, ActionKind::SkipTrigger);
    assert_eq!(t.zone_of(lookout), Zone::Hand);
    assert_eq!(t.hand(p1), 1);
    assert_eq!(t.life(p1), 4);
    assert_eq!(t.state.phase, Phase::Main);
}

#[test]
fn test_blocker_takes_the_hit() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let blocker = t.place(&db, "TS-007", p1, Zone::Field);
    let brawler = t.place(&db, "TS-003", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: brawler, target });
    assert_eq!(t.state.phase, Phase::BlockStep);
    assert_rejected(&t.apply(&engine, p1, ActionKind::PassCounter));

    t.apply(&engine, p1, ActionKind::DeclareBlocker { blocker });
    let combat = t.state.combat.clone().unwrap();
    assert_eq!(combat.target, blocker);
    assert_eq!(combat.target_type, TargetType::Character);
    assert_eq!(t.state.phase, Phase::CounterStep);

    t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(t.zone_of(blocker), Zone::Trash);
    assert_eq!(t.life(p1), 4);
    assert_eq!(t.state.phase, Phase::Main);
}

#[test]
fn test_pass_block_keeps_leader_target() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let blocker = t.place(&db, "TS-007", p1, Zone::Field);
    let brawler = t.place(&db, "TS-003", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: brawler, target });
    t.apply(&engine, p1, ActionKind::PassBlock);
    t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(t.zone_of(blocker), Zone::Field);
    assert!(!t.state.card(blocker).unwrap().is_rested());
    assert_eq!(t.life(p1), 3);
}

#[test]
fn test_attached_don_wins_tie_against_counter() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    t.give_don(p0, 1);
    let counter = t.place(&db, "TS-001", p1, Zone::Hand);
    let (leader, target) = (t.leaders[0], t.leaders[1]);

    t.apply(&engine, p0, ActionKind::AttachDon { target: leader, count: 1 });
    assert_eq!(t.state.power_of(leader).unwrap(), 6000);

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: leader, target });
    t.apply(&engine, p1, ActionKind::PlayCounter { card: counter });
    t.apply(&engine, p1, ActionKind::PassCounter);
    // 6000 against 5000 + 1000: ties go to the attacker
    assert_eq!(t.life(p1), 3);
}

#[test]
fn test_counter_event_buffs_defender_for_the_battle() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    t.give_don(p1, 1);
    let guard = t.place(&db, "TS-E01", p1, Zone::Hand);
    let brawler = t.place(&db, "TS-003", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: brawler, target });
    let outcome = t.apply(&engine, p1, ActionKind::PlayCounter { card: guard });
    assert_eq!(
        outcome,
        Outcome::Paused {
            phase: Phase::CounterEffectStep,
            player: p1
        }
    );
    assert_eq!(t.zone_of(guard), Zone::Trash);

    // At least one target is required
    assert_rejected(&t.apply(&engine, p1, ActionKind::ResolveEffect { targets: vec![] }));
    t.apply(&engine, p1, ActionKind::ResolveEffect { targets: vec![target] });
    assert_eq!(t.state.phase, Phase::CounterStep);
    assert_eq!(t.state.combat.as_ref().unwrap().effect_buff_power, 3000);

    t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(t.life(p1), 4);
    // The battle bonus never touched the leader's own buffs
    assert_eq!(t.state.power_of(target).unwrap(), 5000);
}

#[test]
fn test_counter_event_with_cost_buffs_only_for_the_battle() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let brace = t.place(&db, "TS-E03", p1, Zone::Hand);
    let fodder = t.place(&db, "TS-001", p1, Zone::Hand);
    let brawler = t.place(&db, "TS-003", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: brawler, target });
    let outcome = t.apply(&engine, p1, ActionKind::PlayCounter { card: brace });
    assert_eq!(
        outcome,
        Outcome::Paused {
            phase: Phase::AdditionalCostStep,
            player: p1
        }
    );

    t.apply(&engine, p1, ActionKind::PayAdditionalCost { selection: vec![fodder] });
    assert_eq!(t.zone_of(fodder), Zone::Trash);
    assert_eq!(t.state.phase, Phase::CounterStep);
    // Resuming from the cost step still counts as a counter for this battle
    assert_eq!(t.state.combat.as_ref().unwrap().effect_buff_power, 3000);
    assert!(t.state.card(target).unwrap().buffs.is_empty());

    t.apply(&engine, p1, ActionKind::PassCounter);
    // 6000 against 5000 + 3000
    assert_eq!(t.life(p1), 4);
    assert_eq!(t.state.power_of(target).unwrap(), 5000);
}

#[test]
fn test_banish_trashes_life_without_trigger() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let lookout = t.place(&db, "TS-008", p1, Zone::Life);
    let executioner = t.place(&db, "TS-020", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: executioner, target });
    let outcome = t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(t.zone_of(lookout), Zone::Trash);
    assert_eq!(t.life(p1), 4);
    assert_eq!(t.hand(p1), 0);
    assert_eq!(t.state.phase, Phase::Main);
}

#[test]
fn test_unblockable_skips_block_step() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let blocker = t.place(&db, "TS-007", p1, Zone::Field);
    let phantom = t.place(&db, "TS-021", p0, Zone::Field);
    let target = t.leaders[1];

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: phantom, target });
    assert_eq!(t.state.phase, Phase::CounterStep);
    assert_rejected(&t.apply(&engine, p1, ActionKind::DeclareBlocker { blocker }));

    t.apply(&engine, p1, ActionKind::PassCounter);
    assert!(!t.state.card(blocker).unwrap().is_rested());
    assert_eq!(t.life(p1), 3);
}

#[test]
fn test_would_be_ko_immunity_keeps_character() {
    let db = card_db();
    let engine = GameEngine::new(&db);
    let mut t = Table::new(&db);
    let (p0, p1) = (t.p0, t.p1);
    let wall = t.place(&db, "TS-022", p1, Zone::Field);
    t.state.card_mut(wall).unwrap().rest();
    let brawler = t.place(&db, "TS-003", p0, Zone::Field);

    t.apply(&engine, p0, ActionKind::DeclareAttack { attacker: brawler, target: wall });
    let outcome = t.apply(&engine, p1, ActionKind::PassCounter);
    assert_eq!(outcome, Outcome::Completed);
    // 6000 against 2000, but the K.O. is prevented
    assert_eq!(t.zone_of(wall), Zone::Field);
    assert!(t.state.card(wall).unwrap().restrictions.is_empty());
    assert_eq!(t.state.phase, Phase::Main);
    assert!(t.state.combat.is_none());
}
