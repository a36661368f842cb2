//! Continuous effect reconciler
//!
//! Continuous modifiers are never patched in place. Every pass clears all
//! reconciler-owned state back to a baseline, collects the grants of every
//! PASSIVE / YOUR_TURN / OPPONENT_TURN ability that currently applies
//! (conditions and filters are evaluated against the baseline), then
//! applies them. Running the pass twice in a row yields the same state.

use crate::core::{CardId, Duration, Keyword, PowerBuff, Restriction, RestrictionKind};
use crate::effects::condition;
use crate::effects::engine::{restriction_kind, target_candidates};
use crate::effects::filter::FilterContext;
use crate::effects::{CardLookup, EffectKind};
use crate::game::GameState;

/// One derived modifier waiting to be applied
#[derive(Debug, Clone, PartialEq)]
enum Grant {
    Power { card: CardId, source: CardId, value: i32 },
    Keyword { card: CardId, keyword: Keyword },
    Cost { card: CardId, value: i32 },
    Restriction { card: CardId, source: CardId, kind: RestrictionKind },
}

/// Recompute every continuous modifier from a clean baseline
pub fn reconcile(state: &mut GameState, cards: &dyn CardLookup) {
    for card in state.cards.iter_mut() {
        card.clear_continuous();
    }

    let grants = collect(state, cards);

    let turn = state.turn;
    for grant in grants {
        match grant {
            Grant::Power {
                card,
                source,
                value,
            } => {
                if let Ok(target) = state.card_mut(card) {
                    target.buffs.push(PowerBuff::new(
                        source,
                        value,
                        Duration::StageContinuous,
                        turn,
                        None,
                    ));
                }
            }
            Grant::Keyword { card, keyword } => {
                if let Ok(target) = state.card_mut(card) {
                    if !target.continuous_keywords.contains(&keyword) {
                        target.continuous_keywords.push(keyword);
                    }
                }
            }
            Grant::Cost { card, value } => {
                if let Ok(target) = state.card_mut(card) {
                    target.cost_modifier += value;
                }
            }
            Grant::Restriction { card, source, kind } => {
                if let Ok(target) = state.card_mut(card) {
                    target.restrictions.push(Restriction {
                        kind,
                        source,
                        duration: Duration::StageContinuous,
                        applied_turn: turn,
                        applied_battle: None,
                    });
                }
            }
        }
    }
}

fn collect(state: &GameState, cards: &dyn CardLookup) -> Vec<Grant> {
    let mut grants = Vec::new();
    let active = state.active_player;

    for player in state.player_ids() {
        let Ok(p) = state.player(player) else {
            continue;
        };
        let sources = p
            .zones
            .stage
            .cards
            .iter()
            .chain(p.zones.field.cards.iter())
            .chain(p.zones.leader.cards.iter())
            .copied();

        for source in sources {
            let Ok(card) = state.card(source) else {
                continue;
            };
            let Some(def) = cards.lookup(card.definition.as_str()) else {
                continue;
            };
            for effect in &def.effects {
                if !effect.trigger.applies_continuously(card.owner, active) {
                    continue;
                }
                let ctx = FilterContext::new(state, cards, card.owner, source);
                if !condition::all_hold(&effect.conditions, &ctx) {
                    continue;
                }
                for action in &effect.actions {
                    let targets = match &action.target {
                        Some(spec) => {
                            target_candidates(state, cards, spec, card.owner, source, action.value)
                        }
                        None => vec![source],
                    };
                    for target in targets {
                        if let Some(grant) = grant_for(&action.kind, action, target, source) {
                            grants.push(grant);
                        }
                    }
                }
            }
        }
    }
    grants
}

fn grant_for(
    kind: &EffectKind,
    action: &crate::effects::EffectAction,
    card: CardId,
    source: CardId,
) -> Option<Grant> {
    match kind {
        EffectKind::BuffPower => Some(Grant::Power {
            card,
            source,
            value: action.value,
        }),
        EffectKind::GrantKeyword => action.keyword.clone().map(|keyword| Grant::Keyword { card, keyword }),
        EffectKind::CostModifier => Some(Grant::Cost {
            card,
            value: action.value,
        }),
        EffectKind::ImmuneToKo | EffectKind::ImmuneToBattleKo | EffectKind::CannotAttack => {
            restriction_kind(kind).map(|kind| Grant::Restriction { card, source, kind })
        }
        // One-shot kinds have no continuous meaning
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;
    use crate::effects::CardDefinition;
    use crate::game::RulesConfig;
    use crate::zones::Zone;
    use rustc_hash::FxHashMap;

    struct Cards(FxHashMap<String, CardDefinition>);

    impl CardLookup for Cards {
        fn lookup(&self, id: &str) -> Option<&CardDefinition> {
            self.0.get(id)
        }
    }

    fn cards() -> Cards {
        let defs: Vec<CardDefinition> = serde_json::from_value(serde_json::json!([
            {"id": "L", "name": "Leader", "category": "LEADER", "power": 5000, "life": 4,
             "effects": [{"trigger": "YOUR_TURN",
                          "actions": [{"type": "BUFF_POWER", "value": 1000,
                                       "target": {"scope": "YOUR_CHARACTER", "all": true}}]}]},
            {"id": "S", "name": "Port", "category": "STAGE", "cost": 1,
             "effects": [{"trigger": "PASSIVE",
                          "actions": [{"type": "COST_MODIFIER", "value": -1,
                                       "target": {"scope": "YOUR_HAND", "all": true,
                                                  "filters": [{"type": "CATEGORY", "value": "CHARACTER"}]}}]}]},
            {"id": "G", "name": "Guard", "category": "CHARACTER", "cost": 4, "power": 4000,
             "effects": [{"trigger": "OPPONENT_TURN",
                          "conditions": [{"type": "LIFE_COUNT", "op": "<=", "value": 2}],
                          "actions": [{"type": "GRANT_KEYWORD", "keyword": "BLOCKER"},
                                      {"type": "IMMUNE_TO_BATTLE_KO"}]}]}
        ]))
        .unwrap();
        Cards(defs.into_iter().map(|d| (d.id.as_str().to_string(), d)).collect())
    }

    fn create(state: &mut GameState, db: &Cards, id: &str, owner: PlayerId, zone: Zone) -> CardId {
        let def = db.lookup(id).unwrap().clone();
        state.create_card(&def, owner, zone).unwrap()
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let db = cards();
        let mut state = GameState::new_two_player("t", "A", "B", RulesConfig::default());
        let p0 = PlayerId::new(0);
        create(&mut state, &db, "L", p0, Zone::Leader);
        create(&mut state, &db, "S", p0, Zone::Stage);
        let guard = create(&mut state, &db, "G", p0, Zone::Field);
        let in_hand = create(&mut state, &db, "G", p0, Zone::Hand);
        state.turn = 3;
        state.active_player = p0;

        reconcile(&mut state, &db);
        let once = serde_json::to_value(&state.cards).unwrap();
        reconcile(&mut state, &db);
        let twice = serde_json::to_value(&state.cards).unwrap();
        similar_asserts::assert_eq!(once, twice);

        assert_eq!(state.power_of(guard).unwrap(), 5000);
        assert_eq!(state.card(in_hand).unwrap().effective_cost(), 3);
    }

    #[test]
    fn test_turn_polarity_and_conditions() {
        let db = cards();
        let mut state = GameState::new_two_player("t", "A", "B", RulesConfig::default());
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        create(&mut state, &db, "L", p0, Zone::Leader);
        let guard = create(&mut state, &db, "G", p0, Zone::Field);
        create(&mut state, &db, "L", p0, Zone::Life);
        state.turn = 4;

        // Opponent's turn with 1 life: guard gets blocker and battle immunity
        state.active_player = p1;
        reconcile(&mut state, &db);
        let card = state.card(guard).unwrap();
        assert!(card.has_keyword(&Keyword::Blocker, 4));
        assert!(card.has_restriction(RestrictionKind::ImmuneToBattleKo, 4, None));
        assert_eq!(state.power_of(guard).unwrap(), 4000);

        // Own turn: the leader's buff applies, the guard's ability does not
        state.active_player = p0;
        reconcile(&mut state, &db);
        let card = state.card(guard).unwrap();
        assert!(!card.has_keyword(&Keyword::Blocker, 4));
        assert!(card.restrictions.is_empty());
        assert_eq!(state.power_of(guard).unwrap(), 5000);
    }
}
