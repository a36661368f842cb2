//! OPTCG Forge - deterministic rules engine for a two-player trading-card game
//!
//! The engine owns the authoritative game state, validates every player
//! action and resolves card abilities from structured effect definitions.
//! Identical inputs (including the shuffle seed) always produce identical
//! games, so a server, a client and a replay log agree on every outcome.

pub mod core;
pub mod effects;
pub mod error;
pub mod game;
pub mod history;
pub mod loader;
pub mod zones;

pub use error::{EngineError, Result};
