//! Keyword abilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyword abilities
///
/// Serialized as their rules keyword ("RUSH", "DOUBLE_ATTACK", ...). Anything
/// the engine does not know is kept verbatim in `Other` so definitions still
/// load; an unknown keyword simply has no rules meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Keyword {
    /// May attack the turn it was played
    Rush,
    /// May intercept an attack aimed at its controller's leader or characters
    Blocker,
    /// Life cards flipped by this attacker go to trash, not hand
    Banish,
    /// Deals two damage units to a leader
    DoubleAttack,
    /// The defender may not declare a blocker against this attacker
    Unblockable,

    // Catch-all for other keywords
    Other(String),
}

impl Keyword {
    pub fn as_str(&self) -> &str {
        match self {
            Keyword::Rush => "RUSH",
            Keyword::Blocker => "BLOCKER",
            Keyword::Banish => "BANISH",
            Keyword::DoubleAttack => "DOUBLE_ATTACK",
            Keyword::Unblockable => "UNBLOCKABLE",
            Keyword::Other(s) => s.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Keyword::Other(_))
    }
}

impl From<String> for Keyword {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "RUSH" => Keyword::Rush,
            "BLOCKER" => Keyword::Blocker,
            "BANISH" => Keyword::Banish,
            "DOUBLE_ATTACK" => Keyword::DoubleAttack,
            "UNBLOCKABLE" => Keyword::Unblockable,
            _ => Keyword::Other(s),
        }
    }
}

impl From<Keyword> for String {
    fn from(k: Keyword) -> Self {
        k.as_str().to_string()
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
