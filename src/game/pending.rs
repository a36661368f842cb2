//! Pending effects: the single blocking question the game is waiting on
//!
//! While a `PendingEffect` exists the game sits in the matching pause phase
//! and only the two answers for that variant (resolve or skip) from the named
//! player are legal. Everything needed to validate the answer is stored here,
//! so the whole state can be serialized at any pause.

use crate::core::{CardId, PlayerId};
use crate::effects::AbilityCost;
use crate::game::Phase;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// A target or card selection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub source: CardId,
    pub player: PlayerId,
    pub description: String,
    pub candidates: Vec<CardId>,
    pub min: usize,
    pub max: usize,
}

impl SelectionRequest {
    /// Check a selection against the candidate set and count bounds
    pub fn validate(&self, selection: &[CardId]) -> Result<()> {
        if selection.len() < self.min || selection.len() > self.max {
            return Err(EngineError::InvalidSelection(format!(
                "expected between {} and {} cards, got {}",
                self.min,
                self.max,
                selection.len()
            )));
        }
        for (i, card) in selection.iter().enumerate() {
            if !self.candidates.contains(card) {
                return Err(EngineError::InvalidSelection(format!(
                    "card {card} is not a valid choice"
                )));
            }
            if selection[..i].contains(card) {
                return Err(EngineError::InvalidSelection(format!(
                    "card {card} selected twice"
                )));
            }
        }
        Ok(())
    }
}

/// Optional cost payment for a queued triggered ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRequest {
    pub source: CardId,
    pub player: PlayerId,
    pub description: String,
    /// The ability this payment unblocks
    pub ability: usize,
    pub costs: Vec<AbilityCost>,
    /// Hand cards that may be trashed to pay
    pub candidates: Vec<CardId>,
    /// Exact number of cards to select
    pub select: usize,
}

/// What a choice between options decides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChoicePurpose {
    /// Pick one of an ability's cost alternatives
    CostAlternative { ability: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRequest {
    pub source: CardId,
    pub player: PlayerId,
    pub description: String,
    pub options: Vec<String>,
    pub purpose: ChoicePurpose,
}

/// A revealed life card whose trigger may be activated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRequest {
    pub source: CardId,
    pub player: PlayerId,
    pub description: String,
    /// Damage still to apply after this card is dealt with
    pub remaining_damage: u32,
}

/// The blocking pause record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingEffect {
    PlayEffect(SelectionRequest),
    AttackEffect(SelectionRequest),
    EventEffect(SelectionRequest),
    CounterEffect(SelectionRequest),
    ActivateEffect(SelectionRequest),
    PreGameEffect(SelectionRequest),
    DeckReveal(SelectionRequest),
    HandSelect(SelectionRequest),
    FieldSelect(SelectionRequest),
    AdditionalCost(CostRequest),
    Choice(ChoiceRequest),
    LifeTrigger(TriggerRequest),
}

/// Which pair of answers a pending effect accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// ResolveEffect / SkipEffect
    Effect,
    /// SelectCards / SkipSelection
    Selection,
    /// PayAdditionalCost / SkipAdditionalCost
    Cost,
    /// ChooseOption / DeclineChoice
    Choice,
    /// ActivateTrigger / SkipTrigger
    Trigger,
}

impl PendingEffect {
    /// The pause phase this pending effect holds the game in
    pub fn phase(&self) -> Phase {
        match self {
            PendingEffect::PlayEffect(_) => Phase::PlayEffectStep,
            PendingEffect::AttackEffect(_) => Phase::AttackEffectStep,
            PendingEffect::EventEffect(_) => Phase::EventEffectStep,
            PendingEffect::CounterEffect(_) => Phase::CounterEffectStep,
            PendingEffect::ActivateEffect(_) => Phase::FieldSelectStep,
            PendingEffect::PreGameEffect(_) => Phase::PreGameSetup,
            PendingEffect::DeckReveal(_) => Phase::DeckRevealStep,
            PendingEffect::HandSelect(_) => Phase::HandSelectStep,
            PendingEffect::FieldSelect(_) => Phase::FieldSelectStep,
            PendingEffect::AdditionalCost(_) => Phase::AdditionalCostStep,
            PendingEffect::Choice(_) => Phase::ChoiceStep,
            PendingEffect::LifeTrigger(_) => Phase::TriggerStep,
        }
    }

    pub fn answer_kind(&self) -> AnswerKind {
        match self {
            PendingEffect::PlayEffect(_)
            | PendingEffect::AttackEffect(_)
            | PendingEffect::EventEffect(_)
            | PendingEffect::CounterEffect(_)
            | PendingEffect::ActivateEffect(_)
            | PendingEffect::PreGameEffect(_) => AnswerKind::Effect,
            PendingEffect::DeckReveal(_)
            | PendingEffect::HandSelect(_)
            | PendingEffect::FieldSelect(_) => AnswerKind::Selection,
            PendingEffect::AdditionalCost(_) => AnswerKind::Cost,
            PendingEffect::Choice(_) => AnswerKind::Choice,
            PendingEffect::LifeTrigger(_) => AnswerKind::Trigger,
        }
    }

    /// The player who must answer
    pub fn player(&self) -> PlayerId {
        match self {
            PendingEffect::PlayEffect(r)
            | PendingEffect::AttackEffect(r)
            | PendingEffect::EventEffect(r)
            | PendingEffect::CounterEffect(r)
            | PendingEffect::ActivateEffect(r)
            | PendingEffect::PreGameEffect(r)
            | PendingEffect::DeckReveal(r)
            | PendingEffect::HandSelect(r)
            | PendingEffect::FieldSelect(r) => r.player,
            PendingEffect::AdditionalCost(r) => r.player,
            PendingEffect::Choice(r) => r.player,
            PendingEffect::LifeTrigger(r) => r.player,
        }
    }

    pub fn source(&self) -> CardId {
        match self {
            PendingEffect::PlayEffect(r)
            | PendingEffect::AttackEffect(r)
            | PendingEffect::EventEffect(r)
            | PendingEffect::CounterEffect(r)
            | PendingEffect::ActivateEffect(r)
            | PendingEffect::PreGameEffect(r)
            | PendingEffect::DeckReveal(r)
            | PendingEffect::HandSelect(r)
            | PendingEffect::FieldSelect(r) => r.source,
            PendingEffect::AdditionalCost(r) => r.source,
            PendingEffect::Choice(r) => r.source,
            PendingEffect::LifeTrigger(r) => r.source,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            PendingEffect::PlayEffect(r)
            | PendingEffect::AttackEffect(r)
            | PendingEffect::EventEffect(r)
            | PendingEffect::CounterEffect(r)
            | PendingEffect::ActivateEffect(r)
            | PendingEffect::PreGameEffect(r)
            | PendingEffect::DeckReveal(r)
            | PendingEffect::HandSelect(r)
            | PendingEffect::FieldSelect(r) => &r.description,
            PendingEffect::AdditionalCost(r) => &r.description,
            PendingEffect::Choice(r) => &r.description,
            PendingEffect::LifeTrigger(r) => &r.description,
        }
    }

    /// The selection request, for variants that carry one
    pub fn selection(&self) -> Option<&SelectionRequest> {
        match self {
            PendingEffect::PlayEffect(r)
            | PendingEffect::AttackEffect(r)
            | PendingEffect::EventEffect(r)
            | PendingEffect::CounterEffect(r)
            | PendingEffect::ActivateEffect(r)
            | PendingEffect::PreGameEffect(r)
            | PendingEffect::DeckReveal(r)
            | PendingEffect::HandSelect(r)
            | PendingEffect::FieldSelect(r) => Some(r),
            _ => None,
        }
    }

    /// Cards offered to the answering player
    pub fn candidates(&self) -> Vec<CardId> {
        match self {
            PendingEffect::AdditionalCost(r) => r.candidates.clone(),
            PendingEffect::LifeTrigger(r) => vec![r.source],
            PendingEffect::Choice(_) => Vec::new(),
            other => other
                .selection()
                .map(|r| r.candidates.clone())
                .unwrap_or_default(),
        }
    }
}
