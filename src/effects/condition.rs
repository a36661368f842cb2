//! Condition registry
//!
//! Conditions gate whether an ability applies at all. Like filters they are
//! stored as `{"type", "op", "value", "whose"}` records and converted into a
//! closed enum; an unrecognized type becomes `Condition::Unknown`, which
//! passes and logs a diagnostic.

use crate::core::{CardState, Comparison, PlayerId};
use crate::effects::filter::FilterContext;
use serde::{Deserialize, Serialize};

/// Which player a counting condition looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Whose {
    #[default]
    You,
    Opponent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    YourTurn,
    OpponentTurn,
    /// DON on your field (cost area plus attached)
    DonOnField(Comparison, i32),
    /// DON attached to the ability's card
    AttachedDon(Comparison, i32),
    LifeCount(Whose, Comparison, i32),
    HandCount(Whose, Comparison, i32),
    /// Characters on the field
    FieldCount(Whose, Comparison, i32),
    TrashCount(Whose, Comparison, i32),
    /// Your leader has this trait
    LeaderTrait(String),
    /// Your leader has this name
    LeaderName(String),
    /// The ability's card is active/rested
    SelfState(CardState),
    Unknown(RawCondition),
}

/// Serialized shape of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCondition {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub op: Comparison,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
    #[serde(default)]
    pub whose: Whose,
}

impl RawCondition {
    fn new(kind: &str, whose: Whose, op: Comparison, value: serde_json::Value) -> Self {
        RawCondition {
            kind: kind.to_string(),
            op,
            value,
            whose,
        }
    }
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        let int = raw.value.as_i64().map(|v| v as i32);
        let text = raw.value.as_str().map(str::to_string);
        let parsed = match raw.kind.to_ascii_uppercase().as_str() {
            "YOUR_TURN" => Some(Condition::YourTurn),
            "OPPONENT_TURN" => Some(Condition::OpponentTurn),
            "DON_ON_FIELD" | "DON_COUNT" => int.map(|v| Condition::DonOnField(raw.op, v)),
            "ATTACHED_DON" => int.map(|v| Condition::AttachedDon(raw.op, v)),
            "LIFE_COUNT" => int.map(|v| Condition::LifeCount(raw.whose, raw.op, v)),
            "HAND_COUNT" => int.map(|v| Condition::HandCount(raw.whose, raw.op, v)),
            "FIELD_COUNT" => int.map(|v| Condition::FieldCount(raw.whose, raw.op, v)),
            "TRASH_COUNT" => int.map(|v| Condition::TrashCount(raw.whose, raw.op, v)),
            "LEADER_TRAIT" => text.map(Condition::LeaderTrait),
            "LEADER_NAME" => text.map(Condition::LeaderName),
            "SELF_STATE" => match text.as_deref().map(str::to_ascii_uppercase).as_deref() {
                Some("ACTIVE") => Some(Condition::SelfState(CardState::Active)),
                Some("RESTED") => Some(Condition::SelfState(CardState::Rested)),
                _ => None,
            },
            _ => None,
        };
        parsed.unwrap_or(Condition::Unknown(raw))
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        use serde_json::Value;
        let you = Whose::You;
        let any = Comparison::default();
        match condition {
            Condition::YourTurn => RawCondition::new("YOUR_TURN", you, any, Value::Null),
            Condition::OpponentTurn => RawCondition::new("OPPONENT_TURN", you, any, Value::Null),
            Condition::DonOnField(op, v) => RawCondition::new("DON_ON_FIELD", you, op, v.into()),
            Condition::AttachedDon(op, v) => RawCondition::new("ATTACHED_DON", you, op, v.into()),
            Condition::LifeCount(w, op, v) => RawCondition::new("LIFE_COUNT", w, op, v.into()),
            Condition::HandCount(w, op, v) => RawCondition::new("HAND_COUNT", w, op, v.into()),
            Condition::FieldCount(w, op, v) => RawCondition::new("FIELD_COUNT", w, op, v.into()),
            Condition::TrashCount(w, op, v) => RawCondition::new("TRASH_COUNT", w, op, v.into()),
            Condition::LeaderTrait(t) => RawCondition::new("LEADER_TRAIT", you, any, t.into()),
            Condition::LeaderName(n) => RawCondition::new("LEADER_NAME", you, any, n.into()),
            Condition::SelfState(s) => RawCondition::new(
                "SELF_STATE",
                you,
                any,
                serde_json::to_value(s).unwrap_or(Value::Null),
            ),
            Condition::Unknown(raw) => raw,
        }
    }
}

impl Condition {
    pub fn is_known(&self) -> bool {
        !matches!(self, Condition::Unknown(_))
    }

    /// Does the condition currently hold? Unknown conditions hold.
    pub fn holds(&self, ctx: &FilterContext<'_>) -> bool {
        let state = ctx.state;
        let whose = |w: Whose| -> PlayerId {
            match w {
                Whose::You => ctx.you,
                Whose::Opponent => ctx.opponent(),
            }
        };
        let count = |w: Whose, f: fn(&crate::core::PlayerState) -> usize| -> i32 {
            state.player(whose(w)).map(|p| f(p) as i32).unwrap_or(0)
        };

        match self {
            Condition::YourTurn => state.active_player == ctx.you,
            Condition::OpponentTurn => state.active_player != ctx.you,
            Condition::DonOnField(op, v) => {
                op.compare(count(Whose::You, |p| p.don_on_field()), *v)
            }
            Condition::AttachedDon(op, v) => op.compare(state.attached_don(ctx.source) as i32, *v),
            Condition::LifeCount(w, op, v) => op.compare(count(*w, |p| p.life_count()), *v),
            Condition::HandCount(w, op, v) => op.compare(count(*w, |p| p.hand_count()), *v),
            Condition::FieldCount(w, op, v) => op.compare(count(*w, |p| p.zones.field.len()), *v),
            Condition::TrashCount(w, op, v) => op.compare(count(*w, |p| p.zones.trash.len()), *v),
            Condition::LeaderTrait(wanted) => leader_definition(ctx)
                .is_some_and(|def| def.has_trait(wanted)),
            Condition::LeaderName(name) => leader_definition(ctx).is_some_and(|def| {
                def.name.normalized() == crate::core::normalize_name(name)
            }),
            Condition::SelfState(wanted) => state
                .card(ctx.source)
                .map(|c| c.state == *wanted)
                .unwrap_or(false),
            Condition::Unknown(raw) => {
                state
                    .logger
                    .diagnostic(&format!("unknown condition type {} treated as pass", raw.kind));
                true
            }
        }
    }
}

fn leader_definition<'a>(ctx: &FilterContext<'a>) -> Option<&'a crate::effects::CardDefinition> {
    let leader = ctx.state.player(ctx.you).ok()?.leader()?;
    let card = ctx.state.card(leader).ok()?;
    ctx.cards.lookup(card.definition.as_str())
}

/// All conditions must hold
pub fn all_hold(conditions: &[Condition], ctx: &FilterContext<'_>) -> bool {
    conditions.iter().all(|c| c.holds(ctx))
}
