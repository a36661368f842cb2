//! Deterministic state hashing
//!
//! Two engines that applied the same actions to the same initial state must
//! agree on this hash. Presentation and bookkeeping fields are excluded.

use crate::game::GameState;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Fields that never affect gameplay
///
/// - logger: presentation layer
/// - history: the log of how the state was reached, not the state itself
/// - changes: per-action scratch buffer
const EXCLUDED_FIELDS: &[&str] = &["logger", "history", "changes"];

/// Compute a deterministic hash of game state
///
/// The state is serialized to JSON (object keys come out sorted), stripped of
/// excluded fields and hashed as a canonical string.
pub fn compute_state_hash(game: &GameState) -> u64 {
    let json_value = match serde_json::to_value(game) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: Failed to serialize game state for hashing: {}", e);
            return 0;
        }
    };

    let cleaned = strip_metadata(json_value);

    let canonical = match serde_json::to_string(&cleaned) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Warning: Failed to canonicalize cleaned state: {}", e);
            return 0;
        }
    };

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn strip_metadata(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) => {
            for field in EXCLUDED_FIELDS {
                map.remove(*field);
            }
            serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, strip_metadata(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(strip_metadata).collect())
        }
        other => other,
    }
}

/// Format a hash for display (shows first 8 hex digits)
pub fn format_hash(hash: u64) -> String {
    format!("{:08x}", (hash >> 32) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RulesConfig;

    #[test]
    fn test_strip_metadata() {
        let json = serde_json::json!({
            "turn": 5,
            "logger": {"verbosity": "NORMAL"},
            "history": {"entries": []},
            "players": [{"name": "A"}]
        });

        assert_eq!(
            strip_metadata(json),
            serde_json::json!({"turn": 5, "players": [{"name": "A"}]})
        );
    }

    #[test]
    fn test_hash_ignores_logger_and_history() {
        let a = GameState::new_two_player("h", "A", "B", RulesConfig::default());
        let mut b = a.clone();
        b.logger.enable_capture();
        b.logger.minimal("noise");
        assert_eq!(compute_state_hash(&a), compute_state_hash(&b));

        b.turn = 7;
        assert_ne!(compute_state_hash(&a), compute_state_hash(&b));
    }

    #[test]
    fn test_format_hash() {
        assert_eq!(format_hash(0x1234_5678_9abc_def0), "12345678");
    }
}
