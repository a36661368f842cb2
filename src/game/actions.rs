//! Player actions and action outcomes
//!
//! An action is a discriminated record: the acting player plus a kind with
//! its payload. On the wire it looks like
//! `{"player": 0, "kind": "DECLARE_ATTACK", "payload": {"attacker": 12, "target": 40}}`.

use crate::core::{CardId, PlayerId};
use crate::game::Phase;
use serde::{Deserialize, Serialize};

/// An action submitted by a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub player: PlayerId,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(player: PlayerId, kind: ActionKind) -> Self {
        Action { player, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    // Setup
    StartGame {
        first_player: PlayerId,
    },
    KeepHand,
    Mulligan,

    // Main phase
    PlayCard {
        card: CardId,
        /// Own character trashed to make room when the field is full
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replace: Option<CardId>,
    },
    AttachDon {
        target: CardId,
        #[serde(default = "one")]
        count: u32,
    },
    ActivateAbility {
        card: CardId,
        #[serde(default)]
        ability: usize,
    },
    DeclareAttack {
        attacker: CardId,
        target: CardId,
    },
    EndTurn,

    // Combat responses (defending player)
    DeclareBlocker {
        blocker: CardId,
    },
    PassBlock,
    PlayCounter {
        card: CardId,
    },
    PassCounter,

    // Pause-step answers
    ResolveEffect {
        #[serde(default)]
        targets: Vec<CardId>,
    },
    SkipEffect,
    PayAdditionalCost {
        #[serde(default)]
        selection: Vec<CardId>,
    },
    SkipAdditionalCost,
    SelectCards {
        #[serde(default)]
        selection: Vec<CardId>,
    },
    SkipSelection,
    ChooseOption {
        index: usize,
    },
    DeclineChoice,
    ActivateTrigger,
    SkipTrigger,

    Concede,
}

fn one() -> u32 {
    1
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::StartGame { .. } => "START_GAME",
            ActionKind::KeepHand => "KEEP_HAND",
            ActionKind::Mulligan => "MULLIGAN",
            ActionKind::PlayCard { .. } => "PLAY_CARD",
            ActionKind::AttachDon { .. } => "ATTACH_DON",
            ActionKind::ActivateAbility { .. } => "ACTIVATE_ABILITY",
            ActionKind::DeclareAttack { .. } => "DECLARE_ATTACK",
            ActionKind::EndTurn => "END_TURN",
            ActionKind::DeclareBlocker { .. } => "DECLARE_BLOCKER",
            ActionKind::PassBlock => "PASS_BLOCK",
            ActionKind::PlayCounter { .. } => "PLAY_COUNTER",
            ActionKind::PassCounter => "PASS_COUNTER",
            ActionKind::ResolveEffect { .. } => "RESOLVE_EFFECT",
            ActionKind::SkipEffect => "SKIP_EFFECT",
            ActionKind::PayAdditionalCost { .. } => "PAY_ADDITIONAL_COST",
            ActionKind::SkipAdditionalCost => "SKIP_ADDITIONAL_COST",
            ActionKind::SelectCards { .. } => "SELECT_CARDS",
            ActionKind::SkipSelection => "SKIP_SELECTION",
            ActionKind::ChooseOption { .. } => "CHOOSE_OPTION",
            ActionKind::DeclineChoice => "DECLINE_CHOICE",
            ActionKind::ActivateTrigger => "ACTIVATE_TRIGGER",
            ActionKind::SkipTrigger => "SKIP_TRIGGER",
            ActionKind::Concede => "CONCEDE",
        }
    }
}

/// Result of submitting one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Accepted; the game waits in a regular phase
    Completed,
    /// Accepted; the game waits for `player` to answer a pending effect
    Paused { phase: Phase, player: PlayerId },
    /// Accepted; the game has ended
    GameOver { winner: Option<PlayerId> },
    /// Refused; the state is untouched
    Rejected { reason: String },
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Outcome::Rejected { .. })
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Outcome::Rejected {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        let action = Action::new(
            PlayerId::new(0),
            ActionKind::DeclareAttack {
                attacker: CardId::new(12),
                target: CardId::new(40),
            },
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["player"], 0);
        assert_eq!(json["kind"], "DECLARE_ATTACK");
        assert_eq!(json["payload"]["attacker"], 12);

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_unit_action_without_payload() {
        let action: Action = serde_json::from_str(r#"{"player": 1, "kind": "PASS_COUNTER"}"#).unwrap();
        assert_eq!(action.kind, ActionKind::PassCounter);
        assert_eq!(action.player, PlayerId::new(1));
    }

    #[test]
    fn test_payload_defaults() {
        let action: Action =
            serde_json::from_str(r#"{"player": 0, "kind": "ATTACH_DON", "payload": {"target": 3}}"#)
                .unwrap();
        assert_eq!(
            action.kind,
            ActionKind::AttachDon {
                target: CardId::new(3),
                count: 1
            }
        );
    }

    #[test]
    fn test_outcome_accepted() {
        assert!(Outcome::Completed.is_accepted());
        assert!(!Outcome::rejected("wrong phase").is_accepted());
    }
}
