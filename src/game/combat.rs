//! Combat system
//!
//! One battle at a time: attack declaration, block step, counter step,
//! then damage or K.O. The `CombatInfo` record exists only while a battle
//! is in progress and is cleared when the battle ends.

use crate::core::{combat_power, CardCategory, CardId, Keyword, PlayerId, RestrictionKind};
use crate::effects::{GameEvent, TriggerKind};
use crate::game::engine::Flow;
use crate::game::pending::TriggerRequest;
use crate::game::{GameEngine, GameState, PendingEffect, Phase, ResumePoint};
use crate::history::StateChange;
use crate::zones::Zone;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// What kind of card is being attacked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Leader,
    Character,
}

/// State of the battle in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatInfo {
    /// Identifies this battle for battle-scoped buffs and keywords
    pub battle_id: u32,
    pub attacker: CardId,
    pub attacking_player: PlayerId,
    pub target: CardId,
    pub target_type: TargetType,
    pub defending_player: PlayerId,

    /// Attack value used in the final comparison
    pub attack_power: i32,
    /// Counter values added from the defender's hand
    pub counter_power: i32,
    /// Power added to the defender by effects during the counter step
    pub effect_buff_power: i32,

    pub blocked: bool,

    /// Leader damage still to apply
    pub remaining_damage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_damage_player: Option<PlayerId>,
}

impl CombatInfo {
    pub fn new(
        battle_id: u32,
        attacker: CardId,
        attacking_player: PlayerId,
        target: CardId,
        target_type: TargetType,
        defending_player: PlayerId,
    ) -> Self {
        CombatInfo {
            battle_id,
            attacker,
            attacking_player,
            target,
            target_type,
            defending_player,
            attack_power: 0,
            counter_power: 0,
            effect_buff_power: 0,
            blocked: false,
            remaining_damage: 0,
            remaining_damage_player: None,
        }
    }

    /// The blocker becomes the new target of the attack
    pub fn redirect_to_blocker(&mut self, blocker: CardId) {
        self.target = blocker;
        self.target_type = TargetType::Character;
        self.blocked = true;
    }

    /// Power the defender gains on top of its own effective power
    pub fn defense_bonus(&self) -> i32 {
        self.counter_power + self.effect_buff_power
    }

    /// Does the attack succeed? Ties go to the attacker.
    ///
    /// Both sides are clamped to zero before comparing.
    pub fn attack_succeeds(&self, attacker_raw: i32, defender_raw: i32) -> bool {
        combat_power(attacker_raw) >= combat_power(defender_raw) + self.defense_bonus()
    }
}

/// Leader damage dealt by a successful attack
///
/// Double attack deals 2, except that a defender at exactly 1 life only
/// takes 1.
pub fn leader_damage(double_attack: bool, defender_life: usize) -> u32 {
    if double_attack && defender_life != 1 {
        2
    } else {
        1
    }
}

/// Check that `attacker` may attack for `player` right now
pub fn check_attacker(state: &GameState, player: PlayerId, attacker: CardId) -> Result<()> {
    let card = state.card(attacker)?;
    if card.owner != player || !matches!(card.zone, Zone::Leader | Zone::Field) {
        return Err(EngineError::illegal(format!(
            "card {attacker} is not your leader or character"
        )));
    }
    if card.is_rested() {
        return Err(EngineError::illegal(format!("{} is rested", card.name)));
    }
    if state.player(player)?.in_first_turn() {
        return Err(EngineError::illegal(
            "no attacks during your first turn",
        ));
    }
    let turn = state.turn;
    if card.played_turn == Some(turn) && !card.has_keyword(&Keyword::Rush, turn) {
        return Err(EngineError::illegal(format!(
            "{} was played this turn and has no rush",
            card.name
        )));
    }
    if card.has_restriction(RestrictionKind::CannotAttack, turn, state.active_battle()) {
        return Err(EngineError::illegal(format!("{} cannot attack", card.name)));
    }
    Ok(())
}

/// Check that `target` is attackable by `player`: the opponent's leader or a rested character
pub fn check_attack_target(state: &GameState, player: PlayerId, target: CardId) -> Result<TargetType> {
    let card = state.card(target)?;
    if card.owner == player {
        return Err(EngineError::illegal("cannot attack your own cards"));
    }
    match card.zone {
        Zone::Leader => Ok(TargetType::Leader),
        Zone::Field if card.is_rested() => Ok(TargetType::Character),
        Zone::Field => Err(EngineError::illegal(format!(
            "{} is active and cannot be attacked",
            card.name
        ))),
        _ => Err(EngineError::illegal(format!(
            "card {target} is not the opponent's leader or character"
        ))),
    }
}

/// Defender characters that may block the current attack
pub fn eligible_blockers(state: &GameState, combat: &CombatInfo) -> Vec<CardId> {
    if combat.blocked {
        return Vec::new();
    }
    let Ok(defender) = state.player(combat.defending_player) else {
        return Vec::new();
    };
    defender
        .zones
        .field
        .cards
        .iter()
        .copied()
        .filter(|id| *id != combat.target)
        .filter(|id| {
            state.card(*id).is_ok_and(|card| {
                !card.is_rested() && card.has_keyword(&Keyword::Blocker, state.turn)
            })
        })
        .collect()
}

fn battle_over(state: &GameState, combat: &CombatInfo) -> bool {
    !state.in_play(combat.attacker) || !state.in_play(combat.target)
}

impl<'db> GameEngine<'db> {
    fn current_battle(&self, state: &GameState) -> Result<CombatInfo> {
        state
            .combat
            .clone()
            .ok_or_else(|| EngineError::illegal("no battle in progress"))
    }

    fn require_defender(&self, state: &GameState, player: PlayerId) -> Result<CombatInfo> {
        let combat = self.current_battle(state)?;
        if combat.defending_player != player {
            return Err(EngineError::illegal(format!(
                "player {player} is not the defending player"
            )));
        }
        Ok(combat)
    }

    pub(crate) fn declare_attack(
        &self,
        state: &mut GameState,
        player: PlayerId,
        attacker: CardId,
        target: CardId,
    ) -> Result<()> {
        self.require_active(state, player)?;
        check_attacker(state, player, attacker)?;
        let target_type = check_attack_target(state, player, target)?;

        let battle_id = state.next_battle_id;
        state.next_battle_id += 1;
        let defender = state.opponent_of(player);
        state.combat = Some(CombatInfo::new(
            battle_id,
            attacker,
            player,
            target,
            target_type,
            defender,
        ));
        state.rest_card(attacker)?;
        state.logger.normal(&format!(
            "{} attacks {}",
            state.card(attacker)?.name,
            state.card(target)?.name
        ));

        state.resume.push(ResumePoint::BlockStep);
        self.fire(
            state,
            GameEvent::AttackDeclared {
                attacker,
                target,
                player,
            },
        )
    }

    pub(crate) fn resume_block_step(&self, state: &mut GameState) -> Result<Flow> {
        let combat = self.current_battle(state)?;
        if battle_over(state, &combat) {
            state.resume.push(ResumePoint::FinishBattle);
            return Ok(Flow::Continue);
        }
        let unblockable = state
            .card(combat.attacker)?
            .has_keyword(&Keyword::Unblockable, state.turn);
        if unblockable || eligible_blockers(state, &combat).is_empty() {
            log_if_verbose!(state, "no block possible in battle {}", combat.battle_id);
            state.resume.push(ResumePoint::CounterStep);
            return Ok(Flow::Continue);
        }
        state.set_phase(Phase::BlockStep);
        Ok(Flow::Wait)
    }

    pub(crate) fn declare_blocker(
        &self,
        state: &mut GameState,
        player: PlayerId,
        blocker: CardId,
    ) -> Result<()> {
        let combat = self.require_defender(state, player)?;
        if !eligible_blockers(state, &combat).contains(&blocker) {
            return Err(EngineError::illegal(format!(
                "card {blocker} cannot block this attack"
            )));
        }
        state.rest_card(blocker)?;
        if let Some(combat) = state.combat.as_mut() {
            combat.redirect_to_blocker(blocker);
        }
        state
            .logger
            .normal(&format!("{} blocks", state.card(blocker)?.name));
        state.resume.push(ResumePoint::CounterStep);
        self.fire(state, GameEvent::BlockerDeclared { blocker, player })
    }

    pub(crate) fn pass_block(&self, state: &mut GameState, player: PlayerId) -> Result<()> {
        self.require_defender(state, player)?;
        state.resume.push(ResumePoint::CounterStep);
        Ok(())
    }

    pub(crate) fn resume_counter_step(&self, state: &mut GameState) -> Result<Flow> {
        let combat = self.current_battle(state)?;
        if battle_over(state, &combat) {
            state.resume.push(ResumePoint::FinishBattle);
            return Ok(Flow::Continue);
        }
        state.set_phase(Phase::CounterStep);
        Ok(Flow::Wait)
    }

    pub(crate) fn play_counter(
        &self,
        state: &mut GameState,
        player: PlayerId,
        card_id: CardId,
    ) -> Result<()> {
        self.require_defender(state, player)?;
        let card = state.card(card_id)?;
        if card.owner != player || card.zone != Zone::Hand {
            return Err(EngineError::illegal(format!(
                "card {card_id} is not in your hand"
            )));
        }
        let (counter, cost, name) = (card.counter, card.effective_cost(), card.name.clone());
        let def = self.effects().definition(state, card_id).ok_or_else(|| {
            EngineError::InvalidCardData(format!("no definition for card {card_id}"))
        })?;

        match def.category {
            CardCategory::Character if counter > 0 => {
                state.move_card(card_id, Zone::Trash)?;
                if let Some(combat) = state.combat.as_mut() {
                    combat.counter_power += counter;
                }
                state.record(StateChange::CounterAdded {
                    player,
                    value: counter,
                });
                state
                    .logger
                    .normal(&format!("{name} counters for +{counter}"));
                state.resume.push(ResumePoint::CounterStep);
                Ok(())
            }
            CardCategory::Event if def.has_trigger(&TriggerKind::Counter) => {
                self.pay_don(state, player, cost)?;
                state.move_card(card_id, Zone::Trash)?;
                state
                    .logger
                    .normal(&format!("player {player} plays counter event {name}"));
                state.resume.push(ResumePoint::CounterStep);
                self.fire(
                    state,
                    GameEvent::CounterPlayed {
                        card: card_id,
                        player,
                    },
                )
            }
            _ => Err(EngineError::illegal(format!("{name} is not a counter card"))),
        }
    }

    pub(crate) fn pass_counter(&self, state: &mut GameState, player: PlayerId) -> Result<()> {
        self.require_defender(state, player)?;
        self.resolve_battle(state)
    }

    /// Compare powers and queue damage or the K.O. check
    fn resolve_battle(&self, state: &mut GameState) -> Result<()> {
        let combat = self.current_battle(state)?;
        if battle_over(state, &combat) {
            state.resume.push(ResumePoint::FinishBattle);
            return Ok(());
        }

        let attack = state.power_of(combat.attacker)?;
        let defense = state.power_of(combat.target)?;
        let succeeds = combat.attack_succeeds(attack, defense);
        let (turn, battle) = (state.turn, Some(combat.battle_id));
        state.logger.normal(&format!(
            "battle {}: {} vs {} + {}",
            combat.battle_id,
            combat_power(attack),
            combat_power(defense),
            combat.defense_bonus()
        ));

        if !succeeds {
            if let Some(c) = state.combat.as_mut() {
                c.attack_power = attack;
            }
            state.resume.push(ResumePoint::FinishBattle);
            return Ok(());
        }

        match combat.target_type {
            TargetType::Leader => {
                let double = state
                    .card(combat.attacker)?
                    .has_keyword(&Keyword::DoubleAttack, turn);
                let life = state.player(combat.defending_player)?.life_count();
                if let Some(c) = state.combat.as_mut() {
                    c.attack_power = attack;
                    c.remaining_damage = leader_damage(double, life);
                    c.remaining_damage_player = Some(combat.defending_player);
                }
                state.resume.push(ResumePoint::Damage);
                Ok(())
            }
            TargetType::Character => {
                if let Some(c) = state.combat.as_mut() {
                    c.attack_power = attack;
                }
                let target = state.card(combat.target)?;
                if target.has_restriction(RestrictionKind::ImmuneToKo, turn, battle)
                    || target.has_restriction(RestrictionKind::ImmuneToBattleKo, turn, battle)
                {
                    log_if_verbose!(state, "{} is immune to K.O.", target.name);
                    state.resume.push(ResumePoint::FinishBattle);
                    return Ok(());
                }
                state.resume.push(ResumePoint::KoCheck);
                self.fire(
                    state,
                    GameEvent::WouldBeKnockedOut {
                        card: combat.target,
                        owner: combat.defending_player,
                    },
                )
            }
        }
    }

    pub(crate) fn resume_ko_check(&self, state: &mut GameState) -> Result<Flow> {
        let combat = self.current_battle(state)?;
        state.resume.push(ResumePoint::FinishBattle);

        let (turn, battle) = (state.turn, Some(combat.battle_id));
        let target = state.card(combat.target)?;
        if target.zone != Zone::Field {
            return Ok(Flow::Continue);
        }
        if target.has_restriction(RestrictionKind::ImmuneToKo, turn, battle)
            || target.has_restriction(RestrictionKind::ImmuneToBattleKo, turn, battle)
        {
            log_if_verbose!(state, "K.O. of {} prevented", target.name);
            return Ok(Flow::Continue);
        }
        state
            .logger
            .normal(&format!("{} is K.O.'d", target.name));
        state.move_card(combat.target, Zone::Trash)?;
        self.fire(
            state,
            GameEvent::KnockedOut {
                card: combat.target,
                owner: combat.defending_player,
            },
        )?;
        Ok(Flow::Continue)
    }

    /// Apply leader damage one life card at a time
    ///
    /// A revealed [Trigger] pauses the loop; the remaining count stays on the
    /// battle record and the loop picks up again once the trigger is answered.
    pub(crate) fn resume_damage(&self, state: &mut GameState) -> Result<Flow> {
        let combat = self.current_battle(state)?;
        let defender = combat
            .remaining_damage_player
            .unwrap_or(combat.defending_player);
        let banish = state
            .card(combat.attacker)?
            .has_keyword(&Keyword::Banish, state.turn);

        let mut remaining = combat.remaining_damage;
        while remaining > 0 {
            let Some(life) = state.player(defender)?.zones.life.peek_top() else {
                state.logger.minimal(&format!(
                    "{} takes damage with no life left",
                    state.player(defender)?.name.as_str()
                ));
                state.player_loses(defender)?;
                return Ok(Flow::Continue);
            };
            remaining -= 1;
            if let Some(c) = state.combat.as_mut() {
                c.remaining_damage = remaining;
            }

            if banish {
                state.move_card(life, Zone::Trash)?;
                continue;
            }
            let has_trigger = self
                .effects()
                .definition(state, life)
                .is_some_and(|def| def.has_trigger(&TriggerKind::Trigger));
            if has_trigger {
                let card = state.card_mut(life)?;
                card.face_up = true;
                let description = format!("[Trigger] {}", card.name);
                state.resume.push(ResumePoint::Damage);
                state.pending = Some(PendingEffect::LifeTrigger(TriggerRequest {
                    source: life,
                    player: defender,
                    description,
                    remaining_damage: remaining,
                }));
                return Ok(Flow::Continue);
            }
            state.move_card(life, Zone::Hand)?;
        }

        log_if_verbose!(
            state,
            "player {defender} has {} life left",
            state.player(defender)?.life_count()
        );
        state.resume.push(ResumePoint::FinishBattle);
        Ok(Flow::Continue)
    }

    pub(crate) fn finish_battle(&self, state: &mut GameState) -> Result<Flow> {
        for card in state.cards.iter_mut() {
            card.clear_battle_effects();
        }
        state.combat = None;
        state.resume.push(ResumePoint::Main);
        Ok(Flow::Continue)
    }
}
