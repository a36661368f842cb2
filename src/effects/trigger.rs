//! Trigger registry
//!
//! Every trigger keyword an ability can carry is one `TriggerKind` variant
//! and every event the engine emits is one `GameEvent` variant. Matching is a
//! single exhaustive `match`, so adding a keyword is a compile-checked edit.

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trigger keyword of an ability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerKind {
    /// When this card is played
    OnPlay,
    /// When this card attacks
    WhenAttacking,
    /// When this card is declared as a blocker
    OnBlock,
    /// When the opponent declares an attack
    OnOpponentAttack,
    /// When this card is K.O.'d
    OnKo,
    /// Before this card would be K.O.'d in battle (may prevent it)
    WouldBeKo,
    /// Player-activated during the main phase
    ActivateMain,
    /// Event card resolved from hand during the main phase
    Main,
    /// Event card played during the counter step
    Counter,
    /// Revealed from the life pile by damage
    Trigger,
    EndOfYourTurn,
    StartOfGame,
    /// Always-on continuous ability
    Passive,
    /// Continuous during the owner's turn
    YourTurn,
    /// Continuous during the opponent's turn
    OpponentTurn,
    /// Keyword the engine does not know; never matches
    Unknown(String),
}

impl TriggerKind {
    pub fn as_str(&self) -> &str {
        match self {
            TriggerKind::OnPlay => "ON_PLAY",
            TriggerKind::WhenAttacking => "WHEN_ATTACKING",
            TriggerKind::OnBlock => "ON_BLOCK",
            TriggerKind::OnOpponentAttack => "ON_OPPONENT_ATTACK",
            TriggerKind::OnKo => "ON_KO",
            TriggerKind::WouldBeKo => "WOULD_BE_KO",
            TriggerKind::ActivateMain => "ACTIVATE_MAIN",
            TriggerKind::Main => "MAIN",
            TriggerKind::Counter => "COUNTER",
            TriggerKind::Trigger => "TRIGGER",
            TriggerKind::EndOfYourTurn => "END_OF_YOUR_TURN",
            TriggerKind::StartOfGame => "START_OF_GAME",
            TriggerKind::Passive => "PASSIVE",
            TriggerKind::YourTurn => "YOUR_TURN",
            TriggerKind::OpponentTurn => "OPPONENT_TURN",
            TriggerKind::Unknown(s) => s.as_str(),
        }
    }

    /// Does this continuous trigger apply given the ability owner and active player?
    pub fn applies_continuously(&self, owner: PlayerId, active_player: PlayerId) -> bool {
        match self {
            TriggerKind::Passive => true,
            TriggerKind::YourTurn => owner == active_player,
            TriggerKind::OpponentTurn => owner != active_player,
            _ => false,
        }
    }

    /// Does an ability with this trigger, on `card` owned by `owner`, react to `event`?
    pub fn matches(&self, event: &GameEvent, card: CardId, owner: PlayerId) -> bool {
        match (self, event) {
            (TriggerKind::OnPlay, GameEvent::CardPlayed { card: c, .. }) => *c == card,
            (TriggerKind::WhenAttacking, GameEvent::AttackDeclared { attacker, .. }) => {
                *attacker == card
            }
            (TriggerKind::OnOpponentAttack, GameEvent::AttackDeclared { player, .. }) => {
                *player != owner
            }
            (TriggerKind::OnBlock, GameEvent::BlockerDeclared { blocker, .. }) => *blocker == card,
            (TriggerKind::OnKo, GameEvent::KnockedOut { card: c, .. }) => *c == card,
            (TriggerKind::WouldBeKo, GameEvent::WouldBeKnockedOut { card: c, .. }) => *c == card,
            (TriggerKind::Main, GameEvent::EventPlayed { card: c, .. }) => *c == card,
            (TriggerKind::Counter, GameEvent::CounterPlayed { card: c, .. }) => *c == card,
            (TriggerKind::Trigger, GameEvent::LifeRevealed { card: c, .. }) => *c == card,
            (TriggerKind::EndOfYourTurn, GameEvent::TurnEnding { player }) => *player == owner,
            (TriggerKind::StartOfGame, GameEvent::GameStarting { player }) => *player == owner,
            _ => false,
        }
    }
}

impl From<String> for TriggerKind {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "ON_PLAY" => TriggerKind::OnPlay,
            "WHEN_ATTACKING" => TriggerKind::WhenAttacking,
            "ON_BLOCK" => TriggerKind::OnBlock,
            "ON_OPPONENT_ATTACK" | "ON_YOUR_OPPONENTS_ATTACK" => TriggerKind::OnOpponentAttack,
            "ON_KO" => TriggerKind::OnKo,
            "WOULD_BE_KO" => TriggerKind::WouldBeKo,
            "ACTIVATE_MAIN" => TriggerKind::ActivateMain,
            "MAIN" => TriggerKind::Main,
            "COUNTER" => TriggerKind::Counter,
            "TRIGGER" => TriggerKind::Trigger,
            "END_OF_YOUR_TURN" => TriggerKind::EndOfYourTurn,
            "START_OF_GAME" => TriggerKind::StartOfGame,
            "PASSIVE" => TriggerKind::Passive,
            "YOUR_TURN" => TriggerKind::YourTurn,
            "OPPONENT_TURN" | "OPPONENTS_TURN" => TriggerKind::OpponentTurn,
            _ => TriggerKind::Unknown(s),
        }
    }
}

impl From<TriggerKind> for String {
    fn from(t: TriggerKind) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something that happened in the game that abilities may react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    CardPlayed { card: CardId, player: PlayerId },
    EventPlayed { card: CardId, player: PlayerId },
    CounterPlayed { card: CardId, player: PlayerId },
    AttackDeclared { attacker: CardId, target: CardId, player: PlayerId },
    BlockerDeclared { blocker: CardId, player: PlayerId },
    KnockedOut { card: CardId, owner: PlayerId },
    WouldBeKnockedOut { card: CardId, owner: PlayerId },
    LifeRevealed { card: CardId, owner: PlayerId },
    TurnEnding { player: PlayerId },
    GameStarting { player: PlayerId },
}

impl GameEvent {
    /// The card the event is about, scanned even outside the usual zones
    /// (a K.O.'d card is already in trash, a life card is being revealed)
    pub fn subject(&self) -> Option<CardId> {
        match *self {
            GameEvent::CardPlayed { card, .. }
            | GameEvent::EventPlayed { card, .. }
            | GameEvent::CounterPlayed { card, .. }
            | GameEvent::KnockedOut { card, .. }
            | GameEvent::WouldBeKnockedOut { card, .. }
            | GameEvent::LifeRevealed { card, .. } => Some(card),
            GameEvent::AttackDeclared { attacker, .. } => Some(attacker),
            GameEvent::BlockerDeclared { blocker, .. } => Some(blocker),
            GameEvent::TurnEnding { .. } | GameEvent::GameStarting { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_parse_and_unknown() {
        let kinds: Vec<TriggerKind> =
            serde_json::from_str(r#"["ON_PLAY","When Attacking","ON_DANCE"]"#).unwrap();
        assert_eq!(kinds[0], TriggerKind::OnPlay);
        assert_eq!(kinds[1], TriggerKind::WhenAttacking);
        assert_eq!(kinds[2], TriggerKind::Unknown("ON_DANCE".to_string()));
    }

    #[test]
    fn test_unknown_trigger_never_matches() {
        let event = GameEvent::CardPlayed {
            card: CardId::new(3),
            player: PlayerId::new(0),
        };
        let unknown = TriggerKind::Unknown("ON_DANCE".to_string());
        assert!(!unknown.matches(&event, CardId::new(3), PlayerId::new(0)));
        assert!(TriggerKind::OnPlay.matches(&event, CardId::new(3), PlayerId::new(0)));
        assert!(!TriggerKind::OnPlay.matches(&event, CardId::new(4), PlayerId::new(0)));
    }

    #[test]
    fn test_opponent_attack_polarity() {
        let event = GameEvent::AttackDeclared {
            attacker: CardId::new(1),
            target: CardId::new(2),
            player: PlayerId::new(0),
        };
        let kind = TriggerKind::OnOpponentAttack;
        assert!(kind.matches(&event, CardId::new(9), PlayerId::new(1)));
        assert!(!kind.matches(&event, CardId::new(9), PlayerId::new(0)));
    }

    #[test]
    fn test_continuous_turn_polarity() {
        let me = PlayerId::new(0);
        let other = PlayerId::new(1);
        assert!(TriggerKind::YourTurn.applies_continuously(me, me));
        assert!(!TriggerKind::YourTurn.applies_continuously(me, other));
        assert!(TriggerKind::OpponentTurn.applies_continuously(me, other));
        assert!(TriggerKind::Passive.applies_continuously(me, other));
        assert!(!TriggerKind::OnPlay.applies_continuously(me, me));
    }
}
