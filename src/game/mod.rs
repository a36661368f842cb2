//! Game state, phase machine and combat

/// Macro for conditional logging that avoids allocation when feature is disabled
///
/// When verbose-logging feature is disabled, this becomes a no-op at compile time,
/// so hot paths pay nothing for formatting.
macro_rules! log_if_verbose {
    ($state:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $state.logger.normal_fmt(format_args!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$state; // Suppress unused variable warning
        }
    };
}

pub mod actions;
pub mod combat;
pub mod config;
mod engine;
pub mod logger;
pub mod pending;
pub mod phase;
pub mod queries;
pub mod queue;
pub mod snapshot;
pub mod state;
pub mod state_hash;
pub mod view;

pub use actions::{Action, ActionKind, Outcome};
pub use combat::{CombatInfo, TargetType};
pub use config::RulesConfig;
pub use engine::GameEngine;
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use pending::{
    AnswerKind, ChoicePurpose, ChoiceRequest, CostRequest, PendingEffect, SelectionRequest,
    TriggerRequest,
};
pub use phase::Phase;
pub use queries::GameStateView;
pub use queue::{AbilityContext, CostMode, QueuedAbility, QueuedStep, ResumePoint};
pub use snapshot::GameSnapshot;
pub use state::GameState;
pub use state_hash::{compute_state_hash, format_hash};
pub use view::{CardSlot, CardView, GameView, PendingView, PlayerView};
