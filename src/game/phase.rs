//! Game phases and pause steps

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current phase of the game
///
/// The turn cycle is Refresh → Draw → DonPhase → Main → End. Combat adds the
/// BlockStep and CounterStep sub-phases of Main. Pause steps are entered only
/// while a pending effect waits for a player's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    // Setup
    StartWaiting,
    PreGameSetup,
    StartMulligan,

    // Turn cycle
    Refresh,
    Draw,
    #[serde(rename = "RESOURCE_GAIN")]
    DonPhase,
    Main,
    BlockStep,
    CounterStep,
    End,

    // Pause steps
    PlayEffectStep,
    AttackEffectStep,
    EventEffectStep,
    CounterEffectStep,
    AdditionalCostStep,
    DeckRevealStep,
    HandSelectStep,
    FieldSelectStep,
    ChoiceStep,
    TriggerStep,

    GameOver,
}

impl Phase {
    /// Entered only while a pending effect exists
    pub fn is_pause(&self) -> bool {
        matches!(
            self,
            Phase::PreGameSetup
                | Phase::PlayEffectStep
                | Phase::AttackEffectStep
                | Phase::EventEffectStep
                | Phase::CounterEffectStep
                | Phase::AdditionalCostStep
                | Phase::DeckRevealStep
                | Phase::HandSelectStep
                | Phase::FieldSelectStep
                | Phase::ChoiceStep
                | Phase::TriggerStep
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::GameOver)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::StartWaiting => "START_WAITING",
            Phase::PreGameSetup => "PRE_GAME_SETUP",
            Phase::StartMulligan => "START_MULLIGAN",
            Phase::Refresh => "REFRESH",
            Phase::Draw => "DRAW",
            Phase::DonPhase => "RESOURCE_GAIN",
            Phase::Main => "MAIN",
            Phase::BlockStep => "BLOCK_STEP",
            Phase::CounterStep => "COUNTER_STEP",
            Phase::End => "END",
            Phase::PlayEffectStep => "PLAY_EFFECT_STEP",
            Phase::AttackEffectStep => "ATTACK_EFFECT_STEP",
            Phase::EventEffectStep => "EVENT_EFFECT_STEP",
            Phase::CounterEffectStep => "COUNTER_EFFECT_STEP",
            Phase::AdditionalCostStep => "ADDITIONAL_COST_STEP",
            Phase::DeckRevealStep => "DECK_REVEAL_STEP",
            Phase::HandSelectStep => "HAND_SELECT_STEP",
            Phase::FieldSelectStep => "FIELD_SELECT_STEP",
            Phase::ChoiceStep => "CHOICE_STEP",
            Phase::TriggerStep => "TRIGGER_STEP",
            Phase::GameOver => "GAME_OVER",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
