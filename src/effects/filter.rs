//! Filter registry for selecting card instances
//!
//! Filters narrow a target scope by card properties. They are stored in card
//! JSON as `{"type": "COST", "op": "<=", "value": 4}` and converted into the
//! closed `Filter` enum on load. A filter type the engine does not know
//! becomes `Filter::Unknown`, which passes and logs a diagnostic.

use crate::core::{
    CardCategory, CardId, CardState, Color, Comparison, GameCard, Keyword, PlayerId,
};
use crate::effects::CardLookup;
use crate::game::GameState;
use serde::{Deserialize, Serialize};

/// Context needed for evaluating filters and conditions
///
/// "You" is the controller of the ability; `source` is the card carrying it.
pub struct FilterContext<'a> {
    pub state: &'a GameState,
    pub cards: &'a dyn CardLookup,
    pub you: PlayerId,
    pub source: CardId,
}

impl<'a> FilterContext<'a> {
    pub fn new(
        state: &'a GameState,
        cards: &'a dyn CardLookup,
        you: PlayerId,
        source: CardId,
    ) -> Self {
        FilterContext {
            state,
            cards,
            you,
            source,
        }
    }

    pub fn opponent(&self) -> PlayerId {
        self.state.opponent_of(self.you)
    }
}

/// A property test on a card instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFilter", into = "RawFilter")]
pub enum Filter {
    /// Effective cost compared to a value
    Cost(Comparison, i32),
    /// Raw effective power compared to a value
    Power(Comparison, i32),
    Trait(String),
    /// Normalized name equality
    Name(String),
    Color(Color),
    State(CardState),
    Category(CardCategory),
    HasKeyword(Keyword),
    /// Anything but the ability's own card
    NotSelf,
    Unknown(RawFilter),
}

/// Serialized shape of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFilter {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub op: Comparison,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
}

impl RawFilter {
    fn new(kind: &str, op: Comparison, value: serde_json::Value) -> Self {
        RawFilter {
            kind: kind.to_string(),
            op,
            value,
        }
    }

    fn int(&self) -> Option<i32> {
        self.value.as_i64().map(|v| v as i32)
    }

    fn text(&self) -> Option<&str> {
        self.value.as_str()
    }
}

impl From<RawFilter> for Filter {
    fn from(raw: RawFilter) -> Self {
        let parsed = match raw.kind.to_ascii_uppercase().as_str() {
            "COST" => raw.int().map(|v| Filter::Cost(raw.op, v)),
            "POWER" => raw.int().map(|v| Filter::Power(raw.op, v)),
            "TRAIT" => raw.text().map(|t| Filter::Trait(t.to_string())),
            "NAME" => raw.text().map(|n| Filter::Name(n.to_string())),
            "COLOR" => raw.text().and_then(Color::parse).map(Filter::Color),
            "STATE" => match raw.text().map(str::to_ascii_uppercase).as_deref() {
                Some("ACTIVE") => Some(Filter::State(CardState::Active)),
                Some("RESTED") => Some(Filter::State(CardState::Rested)),
                _ => None,
            },
            "CATEGORY" => raw
                .text()
                .and_then(CardCategory::parse)
                .map(Filter::Category),
            "HAS_KEYWORD" | "KEYWORD" => raw
                .text()
                .map(|k| Filter::HasKeyword(Keyword::from(k.to_string()))),
            "NOT_SELF" => Some(Filter::NotSelf),
            _ => None,
        };
        parsed.unwrap_or(Filter::Unknown(raw))
    }
}

impl From<Filter> for RawFilter {
    fn from(filter: Filter) -> Self {
        use serde_json::Value;
        match filter {
            Filter::Cost(op, v) => RawFilter::new("COST", op, Value::from(v)),
            Filter::Power(op, v) => RawFilter::new("POWER", op, Value::from(v)),
            Filter::Trait(t) => RawFilter::new("TRAIT", Comparison::default(), Value::from(t)),
            Filter::Name(n) => RawFilter::new("NAME", Comparison::default(), Value::from(n)),
            Filter::Color(c) => RawFilter::new(
                "COLOR",
                Comparison::default(),
                serde_json::to_value(c).unwrap_or(Value::Null),
            ),
            Filter::State(s) => RawFilter::new(
                "STATE",
                Comparison::default(),
                serde_json::to_value(s).unwrap_or(Value::Null),
            ),
            Filter::Category(c) => RawFilter::new(
                "CATEGORY",
                Comparison::default(),
                serde_json::to_value(c).unwrap_or(Value::Null),
            ),
            Filter::HasKeyword(k) => {
                RawFilter::new("HAS_KEYWORD", Comparison::default(), Value::from(String::from(k)))
            }
            Filter::NotSelf => RawFilter::new("NOT_SELF", Comparison::default(), Value::Null),
            Filter::Unknown(raw) => raw,
        }
    }
}

impl Filter {
    pub fn is_known(&self) -> bool {
        !matches!(self, Filter::Unknown(_))
    }

    /// Does `card` pass this filter? Unknown filters pass.
    pub fn passes(&self, ctx: &FilterContext<'_>, card: &GameCard) -> bool {
        let turn = ctx.state.turn;
        match self {
            Filter::Cost(op, value) => op.compare(card.effective_cost(), *value),
            Filter::Power(op, value) => {
                let power = ctx.state.power_of(card.id).unwrap_or(card.base_power);
                op.compare(power, *value)
            }
            Filter::Trait(wanted) => ctx
                .cards
                .lookup(card.definition.as_str())
                .is_some_and(|def| def.has_trait(wanted)),
            Filter::Name(name) => card.name.normalized() == crate::core::normalize_name(name),
            Filter::Color(color) => ctx
                .cards
                .lookup(card.definition.as_str())
                .is_some_and(|def| def.colors.contains(color)),
            Filter::State(state) => card.state == *state,
            Filter::Category(category) => card.category == *category,
            Filter::HasKeyword(keyword) => card.has_keyword(keyword, turn),
            Filter::NotSelf => card.id != ctx.source,
            Filter::Unknown(raw) => {
                ctx.state
                    .logger
                    .diagnostic(&format!("unknown filter type {} treated as pass", raw.kind));
                true
            }
        }
    }
}

/// All filters must pass
pub fn passes_all(filters: &[Filter], ctx: &FilterContext<'_>, card: &GameCard) -> bool {
    filters.iter().all(|f| f.passes(ctx, card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_filters() {
        let filters: Vec<Filter> = serde_json::from_str(
            r#"[
                {"type": "COST", "op": "<=", "value": 4},
                {"type": "TRAIT", "value": "Straw Hat Crew"},
                {"type": "STATE", "value": "rested"},
                {"type": "NOT_SELF"}
            ]"#,
        )
        .unwrap();
        assert_eq!(filters[0], Filter::Cost(Comparison::AtMost, 4));
        assert_eq!(filters[1], Filter::Trait("Straw Hat Crew".to_string()));
        assert_eq!(filters[2], Filter::State(CardState::Rested));
        assert_eq!(filters[3], Filter::NotSelf);
    }

    #[test]
    fn test_unknown_filter_round_trips_verbatim() {
        let json = r#"{"type":"HAS_BOUNTY","op":">","value":100}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert!(!filter.is_known());
        let back = serde_json::to_value(&filter).unwrap();
        assert_eq!(back["type"], "HAS_BOUNTY");
        assert_eq!(back["value"], 100);
    }

    #[test]
    fn test_malformed_value_is_unknown() {
        let filter: Filter = serde_json::from_str(r#"{"type":"COST","value":"cheap"}"#).unwrap();
        assert!(matches!(filter, Filter::Unknown(_)));
    }
}
