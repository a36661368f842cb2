//! Serializable effect queue and resume points
//!
//! Abilities waiting to resolve are plain data, never closures: a queued
//! ability remembers its source, controller, how its costs are paid and the
//! actions still to run. Once the queue drains, the machine pops the top
//! `ResumePoint` to continue the interrupted flow.

use crate::core::{CardId, PlayerId};
use crate::effects::{EffectAction, TriggerKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Where an ability came from; decides which pause step asks for targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbilityContext {
    Play,
    Attack,
    Event,
    Counter,
    Activate,
    PreGame,
    LifeTrigger,
    Other,
}

impl AbilityContext {
    pub fn for_trigger(trigger: &TriggerKind) -> Self {
        match trigger {
            TriggerKind::OnPlay => AbilityContext::Play,
            TriggerKind::WhenAttacking | TriggerKind::OnOpponentAttack | TriggerKind::OnBlock => {
                AbilityContext::Attack
            }
            TriggerKind::Main => AbilityContext::Event,
            TriggerKind::Counter => AbilityContext::Counter,
            TriggerKind::ActivateMain => AbilityContext::Activate,
            TriggerKind::StartOfGame => AbilityContext::PreGame,
            TriggerKind::Trigger => AbilityContext::LifeTrigger,
            _ => AbilityContext::Other,
        }
    }
}

/// How the costs of a queued ability are paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostMode {
    /// Ask the controller, who may decline (triggered abilities)
    Optional,
    /// Pay if possible without a choice, otherwise the ability fizzles
    Immediate,
    /// Must be paid; failure rejects the action that started it
    Required,
}

/// One action still to run, with its "then" nesting depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedStep {
    pub action: EffectAction,
    pub depth: u8,
}

/// A matched ability waiting to resolve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAbility {
    pub source: CardId,
    pub controller: PlayerId,
    pub ability: usize,
    pub context: AbilityContext,
    pub cost_mode: CostMode,
    pub cost_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_alternative: Option<usize>,
    pub steps: VecDeque<QueuedStep>,
}

impl QueuedAbility {
    pub fn new(
        source: CardId,
        controller: PlayerId,
        ability: usize,
        context: AbilityContext,
        cost_mode: CostMode,
        actions: &[EffectAction],
    ) -> Self {
        QueuedAbility {
            source,
            controller,
            ability,
            context,
            cost_mode,
            cost_paid: false,
            chosen_alternative: None,
            steps: actions
                .iter()
                .map(|action| QueuedStep {
                    action: action.clone(),
                    depth: 0,
                })
                .collect(),
        }
    }

    /// Queue "then" children right after the step that produced them
    pub fn push_children(&mut self, children: &[EffectAction], depth: u8) {
        for child in children.iter().rev() {
            self.steps.push_front(QueuedStep {
                action: child.clone(),
                depth,
            });
        }
    }
}

/// Where the flow continues once the effect queue is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResumePoint {
    Main,
    BlockStep,
    CounterStep,
    /// K.O. the defending character unless something prevented it
    KoCheck,
    /// Continue applying leader damage
    Damage,
    FinishBattle,
    Mulligan,
    EndTurn,
}
