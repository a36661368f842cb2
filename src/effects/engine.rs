//! Effect engine: trigger matching, target resolution and action application
//!
//! The engine is stateless apart from its view of the card database. Every
//! method takes the game state explicitly so it can run against the working
//! copy the game engine commits only on success.

use crate::core::{
    CardCategory, CardId, Duration, GameCard, KeywordGrant, PlayerId, PowerBuff, Restriction,
    RestrictionKind,
};
use crate::effects::condition;
use crate::effects::filter::{self, FilterContext};
use crate::effects::{
    AbilityCost, CardDefinition, CardEffectDefinition, CardLookup, EffectAction, EffectKind,
    GameEvent, TargetScope, TargetSpec, TriggerKind,
};
use crate::game::{AbilityContext, GameState};
use crate::history::StateChange;
use crate::zones::Zone;
use crate::{EngineError, Result};

/// An ability matched by an event
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAbility {
    pub source: CardId,
    pub controller: PlayerId,
    pub ability: usize,
    pub trigger: TriggerKind,
    pub context: AbilityContext,
}

/// Stateless effect resolver over a card database
#[derive(Clone, Copy)]
pub struct EffectEngine<'db> {
    cards: &'db dyn CardLookup,
}

impl<'db> EffectEngine<'db> {
    pub fn new(cards: &'db dyn CardLookup) -> Self {
        EffectEngine { cards }
    }

    pub fn cards(&self) -> &'db dyn CardLookup {
        self.cards
    }

    /// Static definition of a card instance
    pub fn definition(&self, state: &GameState, card: CardId) -> Option<&'db CardDefinition> {
        let card = state.card(card).ok()?;
        self.cards.lookup(card.definition.as_str())
    }

    pub fn ability(
        &self,
        state: &GameState,
        card: CardId,
        index: usize,
    ) -> Option<&'db CardEffectDefinition> {
        self.definition(state, card)?.effects.get(index)
    }

    /// Every ability reacting to `event` whose conditions hold
    ///
    /// Scans the active player's leader, stage and characters, then the
    /// opponent's, then the event's subject card wherever it is (a K.O.'d
    /// character is already in trash, a revealed life card is in limbo).
    pub fn find_triggered(&self, state: &GameState, event: &GameEvent) -> Vec<TriggeredAbility> {
        let mut scanned: Vec<CardId> = Vec::new();
        let active = state.active_player;
        for player in [active, state.opponent_of(active)] {
            let Ok(p) = state.player(player) else {
                continue;
            };
            scanned.extend(p.zones.leader.cards.iter().copied());
            scanned.extend(p.zones.stage.cards.iter().copied());
            scanned.extend(p.zones.field.cards.iter().copied());
        }
        if let Some(subject) = event.subject() {
            if !scanned.contains(&subject) {
                scanned.push(subject);
            }
            self.report_unknown_triggers(state, subject);
        }

        let mut matched = Vec::new();
        for card_id in scanned {
            let Ok(card) = state.card(card_id) else {
                continue;
            };
            let Some(def) = self.cards.lookup(card.definition.as_str()) else {
                continue;
            };
            for (index, effect) in def.effects.iter().enumerate() {
                if !effect.trigger.matches(event, card_id, card.owner) {
                    continue;
                }
                if effect.once_per_turn && card.used_abilities.contains(&index) {
                    continue;
                }
                let ctx = FilterContext::new(state, self.cards, card.owner, card_id);
                if !condition::all_hold(&effect.conditions, &ctx) {
                    continue;
                }
                matched.push(TriggeredAbility {
                    source: card_id,
                    controller: card.owner,
                    ability: index,
                    trigger: effect.trigger.clone(),
                    context: AbilityContext::for_trigger(&effect.trigger),
                });
            }
        }
        matched
    }

    fn report_unknown_triggers(&self, state: &GameState, card: CardId) {
        let Some(def) = self.definition(state, card) else {
            return;
        };
        for effect in &def.effects {
            if let TriggerKind::Unknown(name) = &effect.trigger {
                state.logger.diagnostic(&format!(
                    "unknown trigger {name} on {} never matches",
                    def.id
                ));
            }
        }
    }

    /// Legal candidates for a target specification
    pub fn candidates(
        &self,
        state: &GameState,
        spec: &TargetSpec,
        controller: PlayerId,
        source: CardId,
        value: i32,
    ) -> Vec<CardId> {
        target_candidates(state, self.cards, spec, controller, source, value)
    }

    /// Apply one action to its resolved targets
    ///
    /// Returns the events the action produced (plays, K.O.s) so their
    /// abilities can be queued. State changes are recorded on the state.
    pub fn apply_action(
        &self,
        state: &mut GameState,
        action: &EffectAction,
        controller: PlayerId,
        source: CardId,
        targets: &[CardId],
    ) -> Result<Vec<GameEvent>> {
        let mut events = Vec::new();
        let turn = state.turn;
        let battle = state.active_battle();

        // Card effects with no target spec act on their own card
        let cards: Vec<CardId> = if action.target.is_none() && targets.is_empty() {
            vec![source]
        } else {
            targets.to_vec()
        };

        match &action.kind {
            EffectKind::BuffPower => {
                for card in in_play(state, &cards) {
                    if self.absorb_counter_buff(state, card, action.value) {
                        continue;
                    }
                    state.card_mut(card)?.buffs.push(PowerBuff::new(
                        source,
                        action.value,
                        action.duration,
                        turn,
                        battle,
                    ));
                    state.record(StateChange::PowerBuffed {
                        card,
                        value: action.value,
                        duration: action.duration,
                    });
                }
            }
            EffectKind::SetBasePower => {
                for card in in_play(state, &cards) {
                    state.card_mut(card)?.set_base_power(action.value);
                    state.record(StateChange::BasePowerSet {
                        card,
                        value: action.value,
                    });
                }
            }
            EffectKind::Ko => {
                for card in in_play(state, &cards) {
                    let target = state.card(card)?;
                    if target.category != CardCategory::Character
                        || target.has_restriction(RestrictionKind::ImmuneToKo, turn, battle)
                    {
                        continue;
                    }
                    let owner = target.owner;
                    state.move_card(card, Zone::Trash)?;
                    events.push(GameEvent::KnockedOut { card, owner });
                }
            }
            EffectKind::ReturnToHand => {
                for card in in_play(state, &cards) {
                    if state.card(card)?.category == CardCategory::Character {
                        state.move_card(card, Zone::Hand)?;
                    }
                }
            }
            EffectKind::ReturnToDeckBottom => {
                for card in in_play(state, &cards) {
                    if state.card(card)?.category == CardCategory::Character {
                        state.move_card_to_bottom(card, Zone::Deck)?;
                    }
                }
            }
            EffectKind::Trash => {
                for card in cards {
                    let zone = state.card(card)?.zone;
                    if matches!(zone, Zone::Field | Zone::Stage | Zone::Hand) {
                        state.move_card(card, Zone::Trash)?;
                    }
                }
            }
            EffectKind::Rest => {
                for card in in_play(state, &cards) {
                    state.rest_card(card)?;
                }
            }
            EffectKind::SetActive => {
                for card in in_play(state, &cards) {
                    state.activate_card(card)?;
                }
            }
            EffectKind::Draw => {
                for player in affected_players(state, action, controller, targets) {
                    for _ in 0..count(action.value) {
                        // An effect draw from an empty deck is not a loss
                        if state.draw_card(player)?.is_none() {
                            break;
                        }
                    }
                }
            }
            EffectKind::AddActiveDon | EffectKind::AddRestedDon => {
                let rested = action.kind == EffectKind::AddRestedDon;
                for player in affected_players(state, action, controller, targets) {
                    for _ in 0..count(action.value) {
                        let Some(don) = state.player(player)?.zones.don_deck.peek_top() else {
                            break;
                        };
                        state.move_card(don, Zone::CostArea)?;
                        if rested {
                            state.rest_card(don)?;
                        }
                    }
                }
            }
            EffectKind::GiveDon => {
                for card in in_play(state, &cards) {
                    if !matches!(state.card(card)?.zone, Zone::Leader | Zone::Field) {
                        continue;
                    }
                    for _ in 0..count(action.value) {
                        let Some(don) = rested_don(state, controller)? else {
                            break;
                        };
                        state.attach_don(don, card)?;
                    }
                }
            }
            EffectKind::ReturnDon => {
                for player in affected_players(state, action, controller, targets) {
                    return_don(state, player, count(action.value))?;
                }
            }
            EffectKind::PlayCard => {
                for card in cards {
                    if let Some(event) = self.play_for_free(state, card)? {
                        events.push(event);
                    }
                }
            }
            EffectKind::SearchDeck => {
                let revealed = state
                    .player(controller)?
                    .zones
                    .deck
                    .top(count(action.value) as usize);
                for card in &revealed {
                    if targets.contains(card) {
                        state.move_card(*card, Zone::Hand)?;
                    }
                }
                for card in revealed.iter().filter(|c| !targets.contains(c)) {
                    state.move_card_to_bottom(*card, Zone::Deck)?;
                }
            }
            EffectKind::GrantKeyword => {
                let Some(keyword) = action.keyword.clone() else {
                    state
                        .logger
                        .diagnostic("GRANT_KEYWORD action without a keyword ignored");
                    return Ok(events);
                };
                for card in in_play(state, &cards) {
                    let target = state.card_mut(card)?;
                    if action.duration == Duration::ThisBattle {
                        if !target.temporary_keywords.contains(&keyword) {
                            target.temporary_keywords.push(keyword.clone());
                        }
                    } else {
                        target.granted_keywords.push(KeywordGrant {
                            keyword: keyword.clone(),
                            duration: action.duration,
                            applied_turn: turn,
                        });
                    }
                    state.record(StateChange::KeywordGranted {
                        card,
                        keyword: keyword.clone(),
                        duration: action.duration,
                    });
                }
            }
            EffectKind::CostModifier => {
                state.logger.diagnostic(
                    "COST_MODIFIER only applies from continuous abilities; one-shot use ignored",
                );
            }
            EffectKind::ImmuneToKo | EffectKind::ImmuneToBattleKo | EffectKind::CannotAttack => {
                let kind = restriction_kind(&action.kind).ok_or_else(|| {
                    EngineError::InvalidCardData(format!("{} is not a restriction", action.kind))
                })?;
                for card in in_play(state, &cards) {
                    state.card_mut(card)?.restrictions.push(Restriction {
                        kind,
                        source,
                        duration: action.duration,
                        applied_turn: turn,
                        applied_battle: battle.filter(|_| action.duration == Duration::ThisBattle),
                    });
                    state.record(StateChange::RestrictionAdded {
                        card,
                        kind,
                        duration: action.duration,
                    });
                }
            }
            EffectKind::AddLife => {
                for player in affected_players(state, action, controller, targets) {
                    for _ in 0..count(action.value) {
                        let Some(card) = state.player(player)?.zones.deck.peek_top() else {
                            break;
                        };
                        state.move_card(card, Zone::Life)?;
                    }
                }
            }
            EffectKind::LifeToHand => {
                for player in affected_players(state, action, controller, targets) {
                    for _ in 0..count(action.value) {
                        let Some(card) = state.player(player)?.zones.life.peek_top() else {
                            break;
                        };
                        state.move_card(card, Zone::Hand)?;
                    }
                }
            }
            EffectKind::ExtraTurn => {
                for player in affected_players(state, action, controller, targets) {
                    state.player_mut(player)?.extra_turns += 1;
                    state.record(StateChange::ExtraTurnQueued { player });
                }
            }
            EffectKind::Unknown(name) => {
                state
                    .logger
                    .diagnostic(&format!("unknown effect type {name} fizzles"));
            }
        }

        Ok(events)
    }

    /// Power from a counter ability aimed at the defending card goes to the
    /// battle's effect-buff total instead of the card's buff list
    ///
    /// The ability being resolved is still at the queue front, including
    /// one that resumes after paying a cost.
    fn absorb_counter_buff(&self, state: &mut GameState, card: CardId, value: i32) -> bool {
        let from_counter = state
            .queue
            .front()
            .is_some_and(|queued| queued.context == AbilityContext::Counter);
        if !from_counter {
            return false;
        }
        let Some(combat) = state.combat.as_mut() else {
            return false;
        };
        if combat.target != card {
            return false;
        }
        combat.effect_buff_power += value;
        let player = combat.defending_player;
        state.record(StateChange::CounterAdded { player, value });
        true
    }

    /// Put a character or stage from hand or trash onto the field for free
    fn play_for_free(&self, state: &mut GameState, card_id: CardId) -> Result<Option<GameEvent>> {
        let card = state.card(card_id)?;
        let (owner, category, zone) = (card.owner, card.category, card.zone);
        if !matches!(zone, Zone::Hand | Zone::Trash | Zone::Deck | Zone::Life) {
            return Ok(None);
        }
        match category {
            CardCategory::Character => {
                if state.player(owner)?.zones.field.len() >= state.config.field_limit {
                    state.logger.normal(&format!(
                        "field is full; {} stays in {zone:?}",
                        state.card(card_id)?.name
                    ));
                    return Ok(None);
                }
                state.move_card(card_id, Zone::Field)?;
            }
            CardCategory::Stage => {
                if let Some(old) = state.player(owner)?.zones.stage.peek_top() {
                    state.move_card(old, Zone::Trash)?;
                }
                state.move_card(card_id, Zone::Stage)?;
            }
            _ => return Ok(None),
        }
        let turn = state.turn;
        state.card_mut(card_id)?.played_turn = Some(turn);
        Ok(Some(GameEvent::CardPlayed {
            card: card_id,
            player: owner,
        }))
    }

    /// Can `controller` pay every cost in the list right now?
    pub fn can_pay(
        &self,
        state: &GameState,
        costs: &[AbilityCost],
        controller: PlayerId,
        source: CardId,
    ) -> bool {
        let Ok(player) = state.player(controller) else {
            return false;
        };
        let active_don = state.active_don(controller).map(|d| d.len()).unwrap_or(0);
        let mut rest_don = 0;
        let mut return_don = 0;
        let mut trash = 0;
        let mut life = 0;
        for cost in costs {
            match cost {
                AbilityCost::RestDon { count } => rest_don += *count as usize,
                AbilityCost::ReturnDon { count } => return_don += *count as usize,
                AbilityCost::TrashFromHand { count, .. } => trash += *count as usize,
                AbilityCost::PayLife { count } => life += *count as usize,
                AbilityCost::RestSelf => {
                    let ready = state
                        .card(source)
                        .map(|c| !c.is_rested())
                        .unwrap_or(false);
                    if !ready || !state.in_play(source) {
                        return false;
                    }
                }
                AbilityCost::TrashSelf => {
                    if !state.in_play(source) {
                        return false;
                    }
                }
            }
        }
        rest_don <= active_don
            && return_don <= player.don_on_field()
            && life <= player.life_count()
            && trash <= self.cost_candidates(state, costs, controller, source).len()
    }

    /// Hand cards that can be trashed to pay these costs
    pub fn cost_candidates(
        &self,
        state: &GameState,
        costs: &[AbilityCost],
        controller: PlayerId,
        source: CardId,
    ) -> Vec<CardId> {
        let Ok(player) = state.player(controller) else {
            return Vec::new();
        };
        let ctx = FilterContext::new(state, self.cards, controller, source);
        player
            .zones
            .hand
            .cards
            .iter()
            .copied()
            .filter(|id| *id != source)
            .filter(|id| {
                state.card(*id).is_ok_and(|card| {
                    costs.iter().any(|cost| match cost {
                        AbilityCost::TrashFromHand { filters, .. } => {
                            filter::passes_all(filters, &ctx, card)
                        }
                        _ => false,
                    })
                })
            })
            .collect()
    }

    /// Number of hand cards a cost list asks the player to select
    pub fn selection_size(costs: &[AbilityCost]) -> usize {
        costs
            .iter()
            .map(|c| match c {
                AbilityCost::TrashFromHand { count, .. } => *count as usize,
                _ => 0,
            })
            .sum()
    }

    /// Pay a cost list; `selection` names the hand cards to trash
    pub fn pay(
        &self,
        state: &mut GameState,
        costs: &[AbilityCost],
        controller: PlayerId,
        source: CardId,
        selection: &[CardId],
    ) -> Result<()> {
        if !self.can_pay(state, costs, controller, source) {
            return Err(EngineError::illegal("cannot pay the ability's costs"));
        }
        let wanted = Self::selection_size(costs);
        if selection.len() != wanted {
            return Err(EngineError::InvalidSelection(format!(
                "expected {wanted} card(s) to trash, got {}",
                selection.len()
            )));
        }
        let allowed = self.cost_candidates(state, costs, controller, source);
        for (i, card) in selection.iter().enumerate() {
            if !allowed.contains(card) || selection[..i].contains(card) {
                return Err(EngineError::InvalidSelection(format!(
                    "card {card} cannot be used to pay this cost"
                )));
            }
        }

        for cost in costs {
            match cost {
                AbilityCost::RestDon { count } => {
                    let active = state.active_don(controller)?;
                    for don in active.into_iter().take(*count as usize) {
                        state.rest_card(don)?;
                    }
                }
                AbilityCost::ReturnDon { count } => return_don(state, controller, *count)?,
                AbilityCost::TrashFromHand { .. } => {}
                AbilityCost::PayLife { count } => {
                    for _ in 0..*count {
                        let Some(card) = state.player(controller)?.zones.life.peek_top() else {
                            break;
                        };
                        state.move_card(card, Zone::Hand)?;
                    }
                }
                AbilityCost::RestSelf => state.rest_card(source)?,
                AbilityCost::TrashSelf => state.move_card(source, Zone::Trash)?,
            }
        }
        for card in selection {
            state.move_card(*card, Zone::Trash)?;
        }
        Ok(())
    }
}

/// Candidate cards for a target specification: zone scoping plus filters
pub fn target_candidates(
    state: &GameState,
    cards: &dyn CardLookup,
    spec: &TargetSpec,
    controller: PlayerId,
    source: CardId,
    value: i32,
) -> Vec<CardId> {
    let opponent = state.opponent_of(controller);
    let zone_cards = |player: PlayerId, zone: Zone| -> Vec<CardId> {
        state
            .player(player)
            .map(|p| p.zones.get_zone(zone).cards.clone())
            .unwrap_or_default()
    };

    let scoped: Vec<CardId> = match spec.scope {
        TargetScope::SelfCard => {
            if state.card(source).is_ok() {
                vec![source]
            } else {
                Vec::new()
            }
        }
        TargetScope::YourLeader => zone_cards(controller, Zone::Leader),
        TargetScope::YourCharacter => zone_cards(controller, Zone::Field),
        TargetScope::YourLeaderOrCharacter => {
            let mut all = zone_cards(controller, Zone::Leader);
            all.extend(zone_cards(controller, Zone::Field));
            all
        }
        TargetScope::OpponentLeader => zone_cards(opponent, Zone::Leader),
        TargetScope::OpponentCharacter => zone_cards(opponent, Zone::Field),
        TargetScope::OpponentLeaderOrCharacter => {
            let mut all = zone_cards(opponent, Zone::Leader);
            all.extend(zone_cards(opponent, Zone::Field));
            all
        }
        TargetScope::AnyLeader => {
            let mut all = zone_cards(controller, Zone::Leader);
            all.extend(zone_cards(opponent, Zone::Leader));
            all
        }
        TargetScope::AnyCharacter => {
            let mut all = zone_cards(controller, Zone::Field);
            all.extend(zone_cards(opponent, Zone::Field));
            all
        }
        TargetScope::YourHand => zone_cards(controller, Zone::Hand),
        TargetScope::YourTrash => zone_cards(controller, Zone::Trash),
        TargetScope::YourDeckTop => state
            .player(controller)
            .map(|p| p.zones.deck.top(count(value) as usize))
            .unwrap_or_default(),
    };

    let ctx = FilterContext::new(state, cards, controller, source);
    scoped
        .into_iter()
        .filter(|id| {
            state
                .card(*id)
                .is_ok_and(|card: &GameCard| filter::passes_all(&spec.filters, &ctx, card))
        })
        .collect()
}

/// Restriction placed by a restriction-type effect
pub fn restriction_kind(kind: &EffectKind) -> Option<RestrictionKind> {
    match kind {
        EffectKind::ImmuneToKo => Some(RestrictionKind::ImmuneToKo),
        EffectKind::ImmuneToBattleKo => Some(RestrictionKind::ImmuneToBattleKo),
        EffectKind::CannotAttack => Some(RestrictionKind::CannotAttack),
        _ => None,
    }
}

/// Numeric values of zero mean "one"
fn count(value: i32) -> u32 {
    value.max(1) as u32
}

fn in_play(state: &GameState, cards: &[CardId]) -> Vec<CardId> {
    cards.iter().copied().filter(|c| state.in_play(*c)).collect()
}

/// Player-scoped actions hit the owners of their targets, or the controller
fn affected_players(
    state: &GameState,
    action: &EffectAction,
    controller: PlayerId,
    targets: &[CardId],
) -> Vec<PlayerId> {
    if action.target.is_none() || targets.is_empty() {
        return vec![controller];
    }
    let mut players = Vec::new();
    for target in targets {
        if let Ok(card) = state.card(*target) {
            if !players.contains(&card.owner) {
                players.push(card.owner);
            }
        }
    }
    players
}

fn rested_don(state: &GameState, player: PlayerId) -> Result<Option<CardId>> {
    let cost_area = &state.player(player)?.zones.cost_area.cards;
    Ok(cost_area
        .iter()
        .copied()
        .find(|id| state.card(*id).is_ok_and(|c| c.is_rested())))
}

/// Return DON to the DON deck: rested cost-area DON first, then active, then attached
fn return_don(state: &mut GameState, player: PlayerId, count: u32) -> Result<()> {
    for _ in 0..count {
        let zones = &state.player(player)?.zones;
        let rested = zones
            .cost_area
            .cards
            .iter()
            .copied()
            .find(|id| state.card(*id).is_ok_and(|c| c.is_rested()));
        let next = rested
            .or_else(|| zones.cost_area.peek_top())
            .or_else(|| zones.attached.peek_top());
        let Some(don) = next else {
            break;
        };
        state.move_card(don, Zone::DonDeck)?;
    }
    Ok(())
}
