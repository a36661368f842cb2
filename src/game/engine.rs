//! Phase/turn state machine
//!
//! `GameEngine::apply` is the only way a game changes. It validates the
//! action against the current phase, the acting player's authority and the
//! named cards, runs it on a working copy and commits the copy only when
//! everything succeeded. A rejected action leaves the state untouched.
//!
//! After an action is dispatched the engine drains the effect queue and then
//! pops resume points until it reaches a phase that waits for a player:
//! MAIN, a combat response step, the mulligan, or a pause step holding a
//! pending effect.

use crate::core::{CardCategory, CardId, PlayerId};
use crate::effects::condition;
use crate::effects::continuous;
use crate::effects::{
    AbilityCost, CardEffectDefinition, CardLookup, EffectEngine, EffectKind, FilterContext,
    GameEvent, TargetScope, TriggerKind,
};
use crate::game::pending::{
    AnswerKind, ChoicePurpose, ChoiceRequest, CostRequest, SelectionRequest, TriggerRequest,
};
use crate::game::{
    AbilityContext, Action, ActionKind, CostMode, GameState, Outcome, PendingEffect, Phase,
    QueuedAbility, QueuedStep, ResumePoint,
};
use crate::history::StateChange;
use crate::zones::Zone;
use crate::{EngineError, Result};

/// What the advance loop does after a resume point ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Keep draining the queue / resume stack
    Continue,
    /// A stable phase was reached; wait for the next action
    Wait,
}

/// Progress of paying a queued ability's costs
enum CostProgress {
    Paid,
    Waiting,
    Fizzled,
}

/// The rules engine
///
/// Holds no game state of its own; one engine can drive any number of games
/// that share a card database.
#[derive(Clone, Copy)]
pub struct GameEngine<'db> {
    effects: EffectEngine<'db>,
}

impl<'db> GameEngine<'db> {
    pub fn new(cards: &'db dyn CardLookup) -> Self {
        GameEngine {
            effects: EffectEngine::new(cards),
        }
    }

    pub fn cards(&self) -> &'db dyn CardLookup {
        self.effects.cards()
    }

    pub fn effects(&self) -> &EffectEngine<'db> {
        &self.effects
    }

    /// Apply one action atomically
    pub fn apply(&self, state: &mut GameState, action: &Action) -> Outcome {
        // History and captured log are moved aside so the working copy does not clone them
        let history = std::mem::take(&mut state.history);
        let captured = state.logger.take_entries();
        let mut working = state.clone();
        working.changes.clear();

        match self.dispatch(&mut working, action) {
            Ok(()) => {
                self.reconcile(&mut working);
                let changes = std::mem::take(&mut working.changes);
                working.history = history;
                working.history.record(working.turn, action.clone(), changes);
                working.logger.restore_entries(captured);
                *state = working;
                state.outcome()
            }
            Err(err) => {
                state.history = history;
                state.logger.restore_entries(captured);
                state.logger.normal_fmt(format_args!(
                    "rejected {} from player {}: {err}",
                    action.kind.name(),
                    action.player
                ));
                Outcome::rejected(err.to_string())
            }
        }
    }

    /// Functional form of `apply`
    pub fn step(&self, mut state: GameState, action: Action) -> (GameState, Outcome) {
        let outcome = self.apply(&mut state, &action);
        (state, outcome)
    }

    /// Recompute continuous effects
    pub fn reconcile(&self, state: &mut GameState) {
        continuous::reconcile(state, self.cards());
    }

    fn dispatch(&self, state: &mut GameState, action: &Action) -> Result<()> {
        if state.is_game_over() {
            return Err(EngineError::illegal("the game is over"));
        }
        let player = action.player;
        state.player(player)?;

        if action.kind == ActionKind::Concede {
            state
                .logger
                .minimal(&format!("{} concedes", state.player(player)?.name.as_str()));
            return state.player_loses(player);
        }

        if state.pending.is_some() {
            self.answer_pending(state, player, &action.kind)?;
        } else {
            self.phase_action(state, player, &action.kind)?;
        }
        self.advance(state)
    }

    fn phase_action(&self, state: &mut GameState, player: PlayerId, kind: &ActionKind) -> Result<()> {
        match (state.phase, kind) {
            (Phase::StartWaiting, ActionKind::StartGame { first_player }) => {
                self.start_game(state, *first_player)
            }
            (Phase::StartMulligan, ActionKind::KeepHand) => self.decide_mulligan(state, player, false),
            (Phase::StartMulligan, ActionKind::Mulligan) => self.decide_mulligan(state, player, true),

            (Phase::Main, ActionKind::PlayCard { card, replace }) => {
                self.play_card(state, player, *card, *replace)
            }
            (Phase::Main, ActionKind::AttachDon { target, count }) => {
                self.attach_don(state, player, *target, *count)
            }
            (Phase::Main, ActionKind::ActivateAbility { card, ability }) => {
                self.activate_ability(state, player, *card, *ability)
            }
            (Phase::Main, ActionKind::DeclareAttack { attacker, target }) => {
                self.declare_attack(state, player, *attacker, *target)
            }
            (Phase::Main, ActionKind::EndTurn) => self.end_turn(state, player),

            (Phase::BlockStep, ActionKind::DeclareBlocker { blocker }) => {
                self.declare_blocker(state, player, *blocker)
            }
            (Phase::BlockStep, ActionKind::PassBlock) => self.pass_block(state, player),
            (Phase::CounterStep, ActionKind::PlayCounter { card }) => {
                self.play_counter(state, player, *card)
            }
            (Phase::CounterStep, ActionKind::PassCounter) => self.pass_counter(state, player),

            (phase, kind) => Err(EngineError::illegal(format!(
                "{} is not legal during {phase}",
                kind.name()
            ))),
        }
    }

    pub(crate) fn require_active(&self, state: &GameState, player: PlayerId) -> Result<()> {
        if state.active_player != player {
            return Err(EngineError::illegal(format!(
                "player {player} is not the active player"
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Advance loop

    /// Drain the queue and resume stack until the game waits for a player
    fn advance(&self, state: &mut GameState) -> Result<()> {
        loop {
            self.reconcile(state);
            if state.is_game_over() {
                return Ok(());
            }
            if let Some(pending) = &state.pending {
                let phase = pending.phase();
                state.set_phase(phase);
                return Ok(());
            }
            if !state.queue.is_empty() {
                self.process_front(state)?;
                continue;
            }
            let Some(point) = state.resume.pop() else {
                state
                    .logger
                    .invariant("nothing left to resume; returning to the main phase");
                state.set_phase(Phase::Main);
                return Ok(());
            };
            if self.resume(state, point)? == Flow::Wait {
                return Ok(());
            }
        }
    }

    fn resume(&self, state: &mut GameState, point: ResumePoint) -> Result<Flow> {
        log_if_verbose!(state, "resume {point:?}");
        match point {
            ResumePoint::Main => {
                state.set_phase(Phase::Main);
                Ok(Flow::Wait)
            }
            ResumePoint::BlockStep => self.resume_block_step(state),
            ResumePoint::CounterStep => self.resume_counter_step(state),
            ResumePoint::KoCheck => self.resume_ko_check(state),
            ResumePoint::Damage => self.resume_damage(state),
            ResumePoint::FinishBattle => self.finish_battle(state),
            ResumePoint::Mulligan => self.resume_mulligan(state),
            ResumePoint::EndTurn => self.resume_end_turn(state),
        }
    }

    // ---------------------------------------------------------------------
    // Setup

    fn start_game(&self, state: &mut GameState, first: PlayerId) -> Result<()> {
        state.player(first)?;
        let second = state.opponent_of(first);
        for p in [first, second] {
            if state.player(p)?.leader().is_none() {
                return Err(EngineError::illegal(format!("player {p} has no leader")));
            }
        }

        state.first_player = Some(first);
        state.active_player = first;
        state.logger.minimal(&format!(
            "Game {} starts; {} goes first",
            state.game_id,
            state.player(first)?.name.as_str()
        ));

        state.resume.push(ResumePoint::Mulligan);
        for p in [first, second] {
            self.fire(state, GameEvent::GameStarting { player: p })?;
        }
        Ok(())
    }

    /// Deal opening hands on the first visit, then wait for the next decision
    fn resume_mulligan(&self, state: &mut GameState) -> Result<Flow> {
        let first = state.first_player.unwrap_or(state.active_player);
        let order = [first, state.opponent_of(first)];
        let undecided = order
            .iter()
            .all(|p| state.player(*p).is_ok_and(|ps| !ps.mulligan_decided));
        if undecided {
            let hand_size = state.config.starting_hand;
            for p in order {
                for _ in 0..hand_size {
                    if state.draw_card(p)?.is_none() {
                        break;
                    }
                }
            }
        }
        state.set_phase(Phase::StartMulligan);
        Ok(Flow::Wait)
    }

    fn decide_mulligan(&self, state: &mut GameState, player: PlayerId, redraw: bool) -> Result<()> {
        let first = state
            .first_player
            .ok_or_else(|| EngineError::illegal("the game has not started"))?;
        let order = [first, state.opponent_of(first)];
        let expected = order
            .into_iter()
            .find(|p| state.player(*p).is_ok_and(|ps| !ps.mulligan_decided))
            .ok_or_else(|| EngineError::illegal("both players already decided"))?;
        if player != expected {
            return Err(EngineError::illegal(format!(
                "player {expected} decides on their hand first"
            )));
        }

        if redraw {
            let hand = state.player(player)?.zones.hand.cards.clone();
            for card in hand {
                state.move_card(card, Zone::Deck)?;
            }
            state.shuffle_deck(player)?;
            for _ in 0..state.config.starting_hand {
                if state.draw_card(player)?.is_none() {
                    break;
                }
            }
            log_if_verbose!(state, "player {player} takes a mulligan");
        }
        state.player_mut(player)?.mulligan_decided = true;

        let all_decided = order
            .iter()
            .all(|p| state.player(*p).is_ok_and(|ps| ps.mulligan_decided));
        if all_decided {
            for p in order {
                self.fill_life(state, p)?;
            }
            self.start_turn(state, first)?;
        } else {
            state.resume.push(ResumePoint::Mulligan);
        }
        Ok(())
    }

    /// Life cards come from the top of the deck, as many as the leader's life
    ///
    /// Cards move one at a time, so the deck's top card ends at the bottom of
    /// the life pile and the last card dealt is the first one damage reveals.
    fn fill_life(&self, state: &mut GameState, player: PlayerId) -> Result<()> {
        let life = state
            .player(player)?
            .leader()
            .and_then(|leader| self.effects.definition(state, leader))
            .map(|def| def.life)
            .unwrap_or(0);
        for _ in 0..life {
            let Some(card) = state.player(player)?.zones.deck.peek_top() else {
                break;
            };
            state.move_card(card, Zone::Life)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Turn structure

    /// Run REFRESH, DRAW and RESOURCE_GAIN for `player`, then queue MAIN
    fn start_turn(&self, state: &mut GameState, player: PlayerId) -> Result<()> {
        state.turn += 1;
        state.active_player = player;
        state.player_mut(player)?.turns_taken += 1;
        let turn = state.turn;
        state.record(StateChange::TurnStarted { player, turn });
        state.logger.minimal(&format!(
            "Turn {turn}: {}",
            state.player(player)?.name.as_str()
        ));

        // Refresh: attached DON back to the cost area, everything active
        state.set_phase(Phase::Refresh);
        let battlers: Vec<CardId> = state.player(player)?.zones.battlers().collect();
        for card in battlers {
            state.return_attached_don(card)?;
        }
        let zones = &state.player(player)?.zones;
        let refreshed: Vec<CardId> = zones
            .battlers()
            .chain(zones.stage.cards.iter().copied())
            .chain(zones.cost_area.cards.iter().copied())
            .collect();
        for card in refreshed {
            state.activate_card(card)?;
        }
        self.reconcile(state);

        // The player going first skips the draw on turn 1
        state.set_phase(Phase::Draw);
        if turn != 1 && state.draw_card(player)?.is_none() {
            state.logger.minimal(&format!(
                "{} cannot draw from an empty deck",
                state.player(player)?.name.as_str()
            ));
            return state.player_loses(player);
        }

        state.set_phase(Phase::DonPhase);
        let amount = if turn == 1 {
            state.config.first_turn_don
        } else {
            state.config.don_per_turn
        };
        for _ in 0..amount {
            let Some(don) = state.player(player)?.zones.don_deck.peek_top() else {
                break;
            };
            state.move_card(don, Zone::CostArea)?;
        }

        state.resume.push(ResumePoint::Main);
        Ok(())
    }

    fn end_turn(&self, state: &mut GameState, player: PlayerId) -> Result<()> {
        self.require_active(state, player)?;
        state.resume.push(ResumePoint::EndTurn);
        self.fire(state, GameEvent::TurnEnding { player })
    }

    fn resume_end_turn(&self, state: &mut GameState) -> Result<Flow> {
        state.set_phase(Phase::End);
        for card in state.cards.iter_mut() {
            card.clear_turn_effects();
        }

        let current = state.active_player;
        let opponent = state.opponent_of(current);
        let next = {
            let p = state.player_mut(current)?;
            if p.extra_turns > 0 {
                p.extra_turns -= 1;
                current
            } else {
                opponent
            }
        };
        if next == current {
            log_if_verbose!(state, "player {current} takes an extra turn");
        }
        self.start_turn(state, next)?;
        Ok(Flow::Continue)
    }

    // ---------------------------------------------------------------------
    // Main phase actions

    /// Rest `cost` active DON of `player`
    pub(crate) fn pay_don(&self, state: &mut GameState, player: PlayerId, cost: i32) -> Result<()> {
        let active = state.active_don(player)?;
        let cost = cost.max(0) as usize;
        if active.len() < cost {
            return Err(EngineError::illegal(format!(
                "cost {cost} needs {cost} active DON, only {} available",
                active.len()
            )));
        }
        for don in active.into_iter().take(cost) {
            state.rest_card(don)?;
        }
        Ok(())
    }

    fn play_card(
        &self,
        state: &mut GameState,
        player: PlayerId,
        card_id: CardId,
        replace: Option<CardId>,
    ) -> Result<()> {
        self.require_active(state, player)?;
        let card = state.card(card_id)?;
        if card.owner != player || card.zone != Zone::Hand {
            return Err(EngineError::illegal(format!(
                "card {card_id} is not in player {player}'s hand"
            )));
        }
        let cost = card.effective_cost();
        let name = card.name.clone();
        let def = self.effects.definition(state, card_id).ok_or_else(|| {
            EngineError::InvalidCardData(format!("no definition for card {card_id}"))
        })?;

        match def.category {
            CardCategory::Character => {
                let field = &state.player(player)?.zones.field;
                let full = field.len() >= state.config.field_limit;
                match (full, replace) {
                    (true, None) => {
                        return Err(EngineError::illegal(
                            "the field is full; name a character to replace",
                        ))
                    }
                    (false, Some(_)) => {
                        return Err(EngineError::illegal(
                            "a character can only be replaced when the field is full",
                        ))
                    }
                    (true, Some(old)) if !field.contains(old) => {
                        return Err(EngineError::illegal(format!(
                            "card {old} is not one of your characters"
                        )))
                    }
                    _ => {}
                }
                self.pay_don(state, player, cost)?;
                if let Some(old) = replace {
                    state.move_card(old, Zone::Trash)?;
                }
                state.move_card(card_id, Zone::Field)?;
                let turn = state.turn;
                state.card_mut(card_id)?.played_turn = Some(turn);
                state.logger.normal(&format!("player {player} plays {name}"));
                state.resume.push(ResumePoint::Main);
                self.fire(
                    state,
                    GameEvent::CardPlayed {
                        card: card_id,
                        player,
                    },
                )
            }
            CardCategory::Event => {
                if !def.has_trigger(&TriggerKind::Main) {
                    return Err(EngineError::illegal(format!(
                        "{name} has no [Main] ability"
                    )));
                }
                self.pay_don(state, player, cost)?;
                state.move_card(card_id, Zone::Trash)?;
                state.logger.normal(&format!("player {player} plays event {name}"));
                state.resume.push(ResumePoint::Main);
                self.fire(
                    state,
                    GameEvent::EventPlayed {
                        card: card_id,
                        player,
                    },
                )
            }
            CardCategory::Stage => {
                self.pay_don(state, player, cost)?;
                let previous = state.player(player)?.zones.stage.peek_top();
                if let Some(old) = previous {
                    state.move_card(old, Zone::Trash)?;
                }
                state.move_card(card_id, Zone::Stage)?;
                let turn = state.turn;
                state.card_mut(card_id)?.played_turn = Some(turn);
                state.logger.normal(&format!("player {player} plays stage {name}"));
                state.resume.push(ResumePoint::Main);
                self.fire(
                    state,
                    GameEvent::CardPlayed {
                        card: card_id,
                        player,
                    },
                )
            }
            CardCategory::Leader | CardCategory::Don => Err(EngineError::illegal(format!(
                "{name} cannot be played from hand"
            ))),
        }
    }

    fn attach_don(
        &self,
        state: &mut GameState,
        player: PlayerId,
        target: CardId,
        count: u32,
    ) -> Result<()> {
        self.require_active(state, player)?;
        let card = state.card(target)?;
        if card.owner != player || !matches!(card.zone, Zone::Leader | Zone::Field) {
            return Err(EngineError::illegal(format!(
                "card {target} is not your leader or character"
            )));
        }
        if count == 0 {
            return Err(EngineError::illegal("attach at least one DON"));
        }
        let active = state.active_don(player)?;
        if active.len() < count as usize {
            return Err(EngineError::illegal(format!(
                "only {} active DON available",
                active.len()
            )));
        }
        for don in active.into_iter().take(count as usize) {
            state.attach_don(don, target)?;
        }
        log_if_verbose!(state, "player {player} attaches {count} DON to {target}");
        Ok(())
    }

    /// Base costs plus the chosen alternative, if any
    fn cost_list(ability: &CardEffectDefinition, alternative: Option<usize>) -> Vec<AbilityCost> {
        let mut costs = ability.costs.clone();
        if let Some(extra) = alternative.and_then(|i| ability.alternatives.get(i)) {
            costs.extend(extra.iter().cloned());
        }
        costs
    }

    fn activate_ability(
        &self,
        state: &mut GameState,
        player: PlayerId,
        card_id: CardId,
        index: usize,
    ) -> Result<()> {
        self.require_active(state, player)?;
        let card = state.card(card_id)?;
        if card.owner != player || !state.in_play(card_id) {
            return Err(EngineError::illegal(format!(
                "card {card_id} is not in play under your control"
            )));
        }
        let ability = self
            .effects
            .ability(state, card_id, index)
            .filter(|a| a.trigger == TriggerKind::ActivateMain)
            .ok_or_else(|| {
                EngineError::illegal(format!("card {card_id} has no [Activate: Main] ability {index}"))
            })?;
        if ability.once_per_turn && card.used_abilities.contains(&index) {
            return Err(EngineError::illegal("ability already used this turn"));
        }
        let ctx = FilterContext::new(state, self.cards(), player, card_id);
        if !condition::all_hold(&ability.conditions, &ctx) {
            return Err(EngineError::illegal("the ability's conditions are not met"));
        }
        let affordable = if ability.alternatives.is_empty() {
            self.effects
                .can_pay(state, &ability.costs, player, card_id)
        } else {
            (0..ability.alternatives.len()).any(|i| {
                let costs = Self::cost_list(ability, Some(i));
                self.effects.can_pay(state, &costs, player, card_id)
            })
        };
        if !affordable {
            return Err(EngineError::illegal("cannot pay the ability's costs"));
        }

        state
            .logger
            .normal(&format!("player {player} activates {}", ability.describe()));
        state.resume.push(ResumePoint::Main);
        state.queue.push_back(QueuedAbility::new(
            card_id,
            player,
            index,
            AbilityContext::Activate,
            CostMode::Required,
            &ability.actions,
        ));
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Effect queue

    /// Queue every ability that reacts to `event`
    pub(crate) fn fire(&self, state: &mut GameState, event: GameEvent) -> Result<()> {
        for matched in self.effects.find_triggered(state, &event) {
            let mode = match matched.trigger {
                TriggerKind::Main | TriggerKind::Counter | TriggerKind::ActivateMain => {
                    CostMode::Required
                }
                TriggerKind::WouldBeKo => CostMode::Immediate,
                _ => CostMode::Optional,
            };
            let Some(ability) = self
                .effects
                .ability(state, matched.source, matched.ability)
            else {
                state.logger.invariant(&format!(
                    "triggered ability {} of card {} has no definition",
                    matched.ability, matched.source
                ));
                continue;
            };
            log_if_verbose!(
                state,
                "queued {} from card {}",
                ability.describe(),
                matched.source
            );
            state.queue.push_back(QueuedAbility::new(
                matched.source,
                matched.controller,
                matched.ability,
                matched.context,
                mode,
                &ability.actions,
            ));
        }
        Ok(())
    }

    fn process_front(&self, state: &mut GameState) -> Result<()> {
        let Some(front) = state.queue.front().cloned() else {
            return Ok(());
        };
        if front.steps.is_empty() {
            state.queue.pop_front();
            return Ok(());
        }
        let Some(ability) = self.effects.ability(state, front.source, front.ability) else {
            state.logger.invariant(&format!(
                "queued ability {} of card {} has no definition; it fizzles",
                front.ability, front.source
            ));
            state.queue.pop_front();
            return Ok(());
        };

        if !front.cost_paid {
            match self.settle_costs(state, &front, ability)? {
                CostProgress::Paid => self.mark_paid(state)?,
                CostProgress::Waiting => return Ok(()),
                CostProgress::Fizzled => {
                    log_if_verbose!(state, "{} fizzles: costs not paid", ability.describe());
                    state.queue.pop_front();
                    return Ok(());
                }
            }
        }

        let Some(step) = state
            .queue
            .front()
            .and_then(|q| q.steps.front())
            .cloned()
        else {
            return Ok(());
        };
        self.run_step(state, &front, ability, step);
        Ok(())
    }

    fn settle_costs(
        &self,
        state: &mut GameState,
        front: &QueuedAbility,
        ability: &CardEffectDefinition,
    ) -> Result<CostProgress> {
        if !ability.has_costs() {
            return Ok(CostProgress::Paid);
        }
        let (controller, source) = (front.controller, front.source);

        let costs = if ability.alternatives.is_empty() {
            ability.costs.clone()
        } else if let Some(choice) = front.chosen_alternative {
            Self::cost_list(ability, Some(choice))
        } else if front.cost_mode == CostMode::Immediate {
            let pick = (0..ability.alternatives.len())
                .map(|i| Self::cost_list(ability, Some(i)))
                .find(|costs| {
                    !costs.iter().any(AbilityCost::needs_selection)
                        && self.effects.can_pay(state, costs, controller, source)
                });
            return match pick {
                Some(costs) => {
                    self.effects.pay(state, &costs, controller, source, &[])?;
                    Ok(CostProgress::Paid)
                }
                None => Ok(CostProgress::Fizzled),
            };
        } else {
            let options = ability
                .alternatives
                .iter()
                .map(|alt| describe_costs(&ability.costs.iter().chain(alt).cloned().collect::<Vec<_>>()))
                .collect();
            state.pending = Some(PendingEffect::Choice(ChoiceRequest {
                source,
                player: controller,
                description: format!("choose how to pay for {}", ability.describe()),
                options,
                purpose: ChoicePurpose::CostAlternative {
                    ability: front.ability,
                },
            }));
            return Ok(CostProgress::Waiting);
        };

        let needs_selection = costs.iter().any(AbilityCost::needs_selection);
        let affordable = self.effects.can_pay(state, &costs, controller, source);
        match front.cost_mode {
            CostMode::Optional => {
                if !affordable {
                    return Ok(CostProgress::Fizzled);
                }
                state.pending = Some(self.cost_request(state, front, ability, costs));
                Ok(CostProgress::Waiting)
            }
            CostMode::Immediate => {
                if affordable && !needs_selection {
                    self.effects.pay(state, &costs, controller, source, &[])?;
                    Ok(CostProgress::Paid)
                } else {
                    Ok(CostProgress::Fizzled)
                }
            }
            CostMode::Required => {
                if !affordable {
                    return Err(EngineError::illegal(format!(
                        "cannot pay the costs of {}",
                        ability.describe()
                    )));
                }
                if needs_selection {
                    state.pending = Some(self.cost_request(state, front, ability, costs));
                    Ok(CostProgress::Waiting)
                } else {
                    self.effects.pay(state, &costs, controller, source, &[])?;
                    Ok(CostProgress::Paid)
                }
            }
        }
    }

    fn cost_request(
        &self,
        state: &GameState,
        front: &QueuedAbility,
        ability: &CardEffectDefinition,
        costs: Vec<AbilityCost>,
    ) -> PendingEffect {
        let candidates = self
            .effects
            .cost_candidates(state, &costs, front.controller, front.source);
        PendingEffect::AdditionalCost(CostRequest {
            source: front.source,
            player: front.controller,
            description: format!("{} to use {}", describe_costs(&costs), ability.describe()),
            ability: front.ability,
            select: EffectEngine::selection_size(&costs),
            costs,
            candidates,
        })
    }

    /// Costs of the front ability are settled; record once-per-turn use
    fn mark_paid(&self, state: &mut GameState) -> Result<()> {
        let Some(front) = state.queue.front_mut() else {
            return Ok(());
        };
        front.cost_paid = true;
        let (source, index) = (front.source, front.ability);
        if self
            .effects
            .ability(state, source, index)
            .is_some_and(|a| a.once_per_turn)
        {
            let card = state.card_mut(source)?;
            if !card.used_abilities.contains(&index) {
                card.used_abilities.push(index);
            }
        }
        Ok(())
    }

    fn pop_step(state: &mut GameState) {
        if let Some(front) = state.queue.front_mut() {
            front.steps.pop_front();
        }
    }

    /// Resolve the next step of the front ability, pausing if it needs a choice
    fn run_step(
        &self,
        state: &mut GameState,
        front: &QueuedAbility,
        ability: &CardEffectDefinition,
        step: QueuedStep,
    ) {
        let action = &step.action;
        if step.depth > state.config.max_effect_depth {
            state.logger.diagnostic(&format!(
                "{} nested deeper than {} is dropped",
                action.kind, state.config.max_effect_depth
            ));
            Self::pop_step(state);
            return;
        }
        if let EffectKind::Unknown(name) = &action.kind {
            state
                .logger
                .diagnostic(&format!("unknown effect type {name} fizzles"));
            Self::pop_step(state);
            return;
        }

        let Some(spec) = &action.target else {
            Self::pop_step(state);
            self.apply_step(state, front.source, front.controller, &step, &[]);
            return;
        };

        let candidates =
            self.effects
                .candidates(state, spec, front.controller, front.source, action.value);
        if spec.auto_resolves() || candidates.is_empty() {
            Self::pop_step(state);
            if candidates.is_empty() && action.kind != EffectKind::SearchDeck {
                log_if_verbose!(state, "{} has no valid targets", action.kind);
                return;
            }
            self.apply_step(state, front.source, front.controller, &step, &candidates);
            return;
        }

        let len = candidates.len();
        let request = SelectionRequest {
            source: front.source,
            player: front.controller,
            description: ability.describe(),
            candidates,
            min: spec.min.min(len),
            max: spec.max.min(len),
        };
        state.pending = Some(selection_pause(front.context, &action.kind, spec.scope, request));
    }

    /// Apply an action; "then" children run only if it changed something
    fn apply_step(
        &self,
        state: &mut GameState,
        source: CardId,
        controller: PlayerId,
        step: &QueuedStep,
        targets: &[CardId],
    ) {
        let before = state.changes.len();
        match self
            .effects
            .apply_action(state, &step.action, controller, source, targets)
        {
            Ok(events) => {
                if state.changes.len() > before && !step.action.then.is_empty() {
                    if let Some(front) = state.queue.front_mut() {
                        front.push_children(&step.action.then, step.depth.saturating_add(1));
                    }
                }
                for event in events {
                    if let Err(err) = self.fire(state, event) {
                        state
                            .logger
                            .invariant(&format!("queuing abilities for {event:?} failed: {err}"));
                    }
                }
            }
            Err(err) => state.logger.invariant(&format!(
                "{} from card {source} fizzled: {err}",
                step.action.kind
            )),
        }
    }

    // ---------------------------------------------------------------------
    // Pending effect answers

    fn answer_pending(&self, state: &mut GameState, player: PlayerId, kind: &ActionKind) -> Result<()> {
        let Some(pending) = state.pending.clone() else {
            return Ok(());
        };
        if player != pending.player() {
            return Err(EngineError::illegal(format!(
                "waiting for player {} during {}",
                pending.player(),
                state.phase
            )));
        }

        let answer = pending.answer_kind();
        match (&pending, kind) {
            (PendingEffect::AdditionalCost(request), ActionKind::PayAdditionalCost { selection }) => {
                self.effects
                    .pay(state, &request.costs, request.player, request.source, selection)?;
                state.pending = None;
                self.mark_paid(state)
            }
            (PendingEffect::AdditionalCost(_), ActionKind::SkipAdditionalCost)
            | (PendingEffect::Choice(_), ActionKind::DeclineChoice) => {
                state.pending = None;
                if let Some(dropped) = state.queue.pop_front() {
                    log_if_verbose!(state, "ability of card {} declined", dropped.source);
                }
                Ok(())
            }
            (PendingEffect::Choice(request), ActionKind::ChooseOption { index }) => {
                self.choose_option(state, request, *index)
            }
            (PendingEffect::LifeTrigger(request), ActionKind::ActivateTrigger) => {
                self.activate_trigger(state, request)
            }
            (PendingEffect::LifeTrigger(request), ActionKind::SkipTrigger) => {
                state.pending = None;
                state.move_card(request.source, Zone::Hand)
            }
            (_, ActionKind::ResolveEffect { targets }) if answer == AnswerKind::Effect => {
                self.answer_selection(state, &pending, Some(targets.as_slice()))
            }
            (_, ActionKind::SelectCards { selection }) if answer == AnswerKind::Selection => {
                self.answer_selection(state, &pending, Some(selection.as_slice()))
            }
            (_, ActionKind::SkipEffect) if answer == AnswerKind::Effect => {
                self.answer_selection(state, &pending, None)
            }
            (_, ActionKind::SkipSelection) if answer == AnswerKind::Selection => {
                self.answer_selection(state, &pending, None)
            }
            _ => Err(EngineError::illegal(format!(
                "{} does not answer the pending effect during {}",
                kind.name(),
                state.phase
            ))),
        }
    }

    fn answer_selection(
        &self,
        state: &mut GameState,
        pending: &PendingEffect,
        targets: Option<&[CardId]>,
    ) -> Result<()> {
        if let (Some(request), Some(targets)) = (pending.selection(), targets) {
            request.validate(targets)?;
        }
        state.pending = None;

        let Some(front) = state.queue.front_mut() else {
            state
                .logger
                .invariant("pending selection without a queued ability; ignored");
            return Ok(());
        };
        let Some(step) = front.steps.pop_front() else {
            state
                .logger
                .invariant("pending selection without a step to resolve; ignored");
            return Ok(());
        };
        let (source, controller) = (front.source, front.controller);
        if let Some(targets) = targets {
            self.apply_step(state, source, controller, &step, targets);
        }
        Ok(())
    }

    fn choose_option(&self, state: &mut GameState, request: &ChoiceRequest, index: usize) -> Result<()> {
        if index >= request.options.len() {
            return Err(EngineError::InvalidSelection(format!(
                "option {index} does not exist"
            )));
        }
        let ChoicePurpose::CostAlternative { ability: wanted } = request.purpose;
        let Some(front) = state.queue.front().cloned() else {
            state.pending = None;
            state
                .logger
                .invariant("cost choice without a queued ability; ignored");
            return Ok(());
        };
        if front.ability != wanted {
            state.logger.invariant(&format!(
                "cost choice for ability {wanted} but ability {} is queued",
                front.ability
            ));
        }
        let ability = self
            .effects
            .ability(state, front.source, front.ability)
            .ok_or(EngineError::EntityNotFound(front.source.as_u32()))?;
        let costs = Self::cost_list(ability, Some(index));
        if !self.effects.can_pay(state, &costs, front.controller, front.source) {
            return Err(EngineError::illegal(format!(
                "cannot pay option {index}: {}",
                request.options[index]
            )));
        }
        state.pending = None;
        if let Some(front) = state.queue.front_mut() {
            front.chosen_alternative = Some(index);
        }
        Ok(())
    }

    fn activate_trigger(&self, state: &mut GameState, request: &TriggerRequest) -> Result<()> {
        state.pending = None;
        state.move_card(request.source, Zone::Trash)?;
        state.logger.normal(&format!(
            "player {} activates the [Trigger] of {}",
            request.player,
            state.card(request.source)?.name
        ));
        self.fire(
            state,
            GameEvent::LifeRevealed {
                card: request.source,
                owner: request.player,
            },
        )
    }
}

fn describe_costs(costs: &[AbilityCost]) -> String {
    costs
        .iter()
        .map(AbilityCost::describe)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// The pause step a target selection waits in
fn selection_pause(
    context: AbilityContext,
    kind: &EffectKind,
    scope: TargetScope,
    request: SelectionRequest,
) -> PendingEffect {
    if *kind == EffectKind::SearchDeck {
        return PendingEffect::DeckReveal(request);
    }
    if scope == TargetScope::YourHand {
        return PendingEffect::HandSelect(request);
    }
    match context {
        AbilityContext::Play => PendingEffect::PlayEffect(request),
        AbilityContext::Attack => PendingEffect::AttackEffect(request),
        AbilityContext::Event => PendingEffect::EventEffect(request),
        AbilityContext::Counter => PendingEffect::CounterEffect(request),
        AbilityContext::Activate => PendingEffect::ActivateEffect(request),
        AbilityContext::PreGame => PendingEffect::PreGameEffect(request),
        AbilityContext::LifeTrigger | AbilityContext::Other => PendingEffect::FieldSelect(request),
    }
}
