//! Action history and replay
//!
//! Every accepted action is recorded together with the discrete state changes
//! it produced. Replaying the recorded actions against the same initial state
//! (same seed) reproduces the game exactly.

use crate::core::{CardId, Duration, Keyword, PlayerId, RestrictionKind};
use crate::game::{Action, GameEngine, GameState, Outcome, Phase};
use crate::zones::Zone;
use serde::{Deserialize, Serialize};

/// A discrete, observable state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateChange {
    CardMoved {
        card: CardId,
        owner: PlayerId,
        from: Zone,
        to: Zone,
    },
    CardRested {
        card: CardId,
    },
    CardActivated {
        card: CardId,
    },
    PowerBuffed {
        card: CardId,
        value: i32,
        duration: Duration,
    },
    BasePowerSet {
        card: CardId,
        value: i32,
    },
    KeywordGranted {
        card: CardId,
        keyword: Keyword,
        duration: Duration,
    },
    RestrictionAdded {
        card: CardId,
        kind: RestrictionKind,
        duration: Duration,
    },
    CostModified {
        card: CardId,
        value: i32,
    },
    DonAttached {
        don: CardId,
        target: CardId,
    },
    CounterAdded {
        player: PlayerId,
        value: i32,
    },
    ExtraTurnQueued {
        player: PlayerId,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    TurnStarted {
        player: PlayerId,
        turn: u32,
    },
    PlayerLost {
        player: PlayerId,
    },
}

/// One accepted action and its effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub turn: u32,
    pub action: Action,
    pub changes: Vec<StateChange>,
}

/// Ordered log of accepted actions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        HistoryLog {
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, turn: u32, action: Action, changes: Vec<StateChange>) {
        self.entries.push(HistoryEntry {
            turn,
            action,
            changes,
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The accepted actions, in order, ready to be replayed
    pub fn actions(&self) -> Vec<Action> {
        self.entries.iter().map(|e| e.action.clone()).collect()
    }

    /// Entries recorded during the given turn
    pub fn turn_entries(&self, turn: u32) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(move |e| e.turn == turn)
    }
}

/// Apply `actions` in order to `initial`, returning the final state and each outcome
///
/// A rejected action is reported in the outcome list and replay continues,
/// just as a live game would keep waiting for a legal action.
pub fn replay(
    engine: &GameEngine<'_>,
    initial: GameState,
    actions: &[Action],
) -> (GameState, Vec<Outcome>) {
    let mut state = initial;
    let mut outcomes = Vec::with_capacity(actions.len());
    for action in actions {
        outcomes.push(engine.apply(&mut state, action));
    }
    (state, outcomes)
}
