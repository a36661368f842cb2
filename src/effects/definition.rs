//! Static card definitions and structured abilities
//!
//! These types are deserialized as-is from the card JSON produced by the
//! external rules-text parser. The engine never mutates them.

use crate::core::{CardCategory, CardName, Color, DefinitionId, Duration, Keyword};
use crate::effects::condition::Condition;
use crate::effects::filter::Filter;
use crate::effects::trigger::TriggerKind;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only access to card definitions
pub trait CardLookup: Sync {
    fn lookup(&self, id: &str) -> Option<&CardDefinition>;
}

/// Static definition of a printed card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: DefinitionId,
    pub name: CardName,
    pub category: CardCategory,
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    pub cost: i32,
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub counter: i32,
    /// Starting life (leaders only)
    #[serde(default)]
    pub life: u32,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub effects: Vec<CardEffectDefinition>,
}

impl CardDefinition {
    pub fn has_trait(&self, wanted: &str) -> bool {
        let wanted = crate::core::normalize_name(wanted);
        self.traits
            .iter()
            .any(|t| crate::core::normalize_name(t) == wanted)
    }

    pub fn has_trigger(&self, trigger: &TriggerKind) -> bool {
        self.effects.iter().any(|e| &e.trigger == trigger)
    }

    /// Indices of abilities with the given trigger
    pub fn abilities_with(&self, trigger: &TriggerKind) -> Vec<usize> {
        self.effects
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.trigger == trigger)
            .map(|(i, _)| i)
            .collect()
    }

    /// Structural checks only; rules text content is trusted
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(EngineError::InvalidCardData(
                "card definition with empty id".to_string(),
            ));
        }
        if self.category == CardCategory::Leader && self.life == 0 {
            return Err(EngineError::InvalidCardData(format!(
                "leader {} has no life value",
                self.id
            )));
        }
        if self.category == CardCategory::Don {
            return Err(EngineError::InvalidCardData(format!(
                "{} uses the reserved DON category",
                self.id
            )));
        }
        Ok(())
    }

    /// Every rule keyword on this card the engine does not implement
    pub fn unknown_keywords(&self) -> Vec<String> {
        let mut unknown = Vec::new();
        for keyword in &self.keywords {
            if !keyword.is_known() {
                unknown.push(format!("keyword {keyword}"));
            }
        }
        for effect in &self.effects {
            if let TriggerKind::Unknown(t) = &effect.trigger {
                unknown.push(format!("trigger {t}"));
            }
            for condition in &effect.conditions {
                if let Condition::Unknown(raw) = condition {
                    unknown.push(format!("condition {}", raw.kind));
                }
            }
            for action in &effect.actions {
                action.collect_unknown(&mut unknown);
            }
        }
        unknown
    }
}

/// One ability of a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEffectDefinition {
    pub trigger: TriggerKind,
    #[serde(default)]
    pub once_per_turn: bool,
    /// Costs paid before the actions resolve
    #[serde(default)]
    pub costs: Vec<AbilityCost>,
    /// Alternative cost lists; the controller picks exactly one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Vec<AbilityCost>>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub actions: Vec<EffectAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CardEffectDefinition {
    pub fn has_costs(&self) -> bool {
        !self.costs.is_empty() || !self.alternatives.is_empty()
    }

    pub fn describe(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("[{}] ability", self.trigger))
    }
}

/// One step of an ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectAction {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSpec>,
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<Keyword>,
    /// "Then" clauses, run only if this action changed something
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub then: Vec<EffectAction>,
}

impl EffectAction {
    pub fn new(kind: EffectKind) -> Self {
        EffectAction {
            kind,
            target: None,
            value: 0,
            duration: Duration::default(),
            keyword: None,
            then: Vec::new(),
        }
    }

    fn collect_unknown(&self, out: &mut Vec<String>) {
        if let EffectKind::Unknown(k) = &self.kind {
            out.push(format!("effect {k}"));
        }
        if let Some(keyword) = &self.keyword {
            if !keyword.is_known() {
                out.push(format!("keyword {keyword}"));
            }
        }
        if let Some(target) = &self.target {
            for filter in &target.filters {
                if let Filter::Unknown(raw) = filter {
                    out.push(format!("filter {}", raw.kind));
                }
            }
        }
        for child in &self.then {
            child.collect_unknown(out);
        }
    }
}

/// Effect action types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectKind {
    BuffPower,
    SetBasePower,
    Ko,
    ReturnToHand,
    ReturnToDeckBottom,
    Trash,
    Rest,
    SetActive,
    Draw,
    AddActiveDon,
    AddRestedDon,
    /// Attach rested DON from the cost area to the target
    GiveDon,
    /// Return DON from the field to the DON deck
    ReturnDon,
    /// Play a card from hand or trash without paying its cost
    PlayCard,
    /// Look at the top `value` cards, take matching ones to hand
    SearchDeck,
    GrantKeyword,
    CostModifier,
    ImmuneToKo,
    ImmuneToBattleKo,
    CannotAttack,
    /// Top of deck to life
    AddLife,
    /// Top of life to hand
    LifeToHand,
    ExtraTurn,
    Unknown(String),
}

impl EffectKind {
    pub fn as_str(&self) -> &str {
        match self {
            EffectKind::BuffPower => "BUFF_POWER",
            EffectKind::SetBasePower => "SET_BASE_POWER",
            EffectKind::Ko => "KO",
            EffectKind::ReturnToHand => "RETURN_TO_HAND",
            EffectKind::ReturnToDeckBottom => "RETURN_TO_DECK_BOTTOM",
            EffectKind::Trash => "TRASH",
            EffectKind::Rest => "REST",
            EffectKind::SetActive => "SET_ACTIVE",
            EffectKind::Draw => "DRAW",
            EffectKind::AddActiveDon => "ADD_ACTIVE_DON",
            EffectKind::AddRestedDon => "ADD_RESTED_DON",
            EffectKind::GiveDon => "GIVE_DON",
            EffectKind::ReturnDon => "RETURN_DON",
            EffectKind::PlayCard => "PLAY_CARD",
            EffectKind::SearchDeck => "SEARCH_DECK",
            EffectKind::GrantKeyword => "GRANT_KEYWORD",
            EffectKind::CostModifier => "COST_MODIFIER",
            EffectKind::ImmuneToKo => "IMMUNE_TO_KO",
            EffectKind::ImmuneToBattleKo => "IMMUNE_TO_BATTLE_KO",
            EffectKind::CannotAttack => "CANNOT_ATTACK",
            EffectKind::AddLife => "ADD_LIFE",
            EffectKind::LifeToHand => "LIFE_TO_HAND",
            EffectKind::ExtraTurn => "EXTRA_TURN",
            EffectKind::Unknown(s) => s.as_str(),
        }
    }
}

impl From<String> for EffectKind {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "BUFF_POWER" => EffectKind::BuffPower,
            "SET_BASE_POWER" => EffectKind::SetBasePower,
            "KO" => EffectKind::Ko,
            "RETURN_TO_HAND" => EffectKind::ReturnToHand,
            "RETURN_TO_DECK_BOTTOM" => EffectKind::ReturnToDeckBottom,
            "TRASH" => EffectKind::Trash,
            "REST" => EffectKind::Rest,
            "SET_ACTIVE" => EffectKind::SetActive,
            "DRAW" => EffectKind::Draw,
            "ADD_ACTIVE_DON" => EffectKind::AddActiveDon,
            "ADD_RESTED_DON" => EffectKind::AddRestedDon,
            "GIVE_DON" => EffectKind::GiveDon,
            "RETURN_DON" => EffectKind::ReturnDon,
            "PLAY_CARD" => EffectKind::PlayCard,
            "SEARCH_DECK" => EffectKind::SearchDeck,
            "GRANT_KEYWORD" => EffectKind::GrantKeyword,
            "COST_MODIFIER" => EffectKind::CostModifier,
            "IMMUNE_TO_KO" => EffectKind::ImmuneToKo,
            "IMMUNE_TO_BATTLE_KO" => EffectKind::ImmuneToBattleKo,
            "CANNOT_ATTACK" => EffectKind::CannotAttack,
            "ADD_LIFE" => EffectKind::AddLife,
            "LIFE_TO_HAND" => EffectKind::LifeToHand,
            "EXTRA_TURN" => EffectKind::ExtraTurn,
            _ => EffectKind::Unknown(s),
        }
    }
}

impl From<EffectKind> for String {
    fn from(k: EffectKind) -> Self {
        k.as_str().to_string()
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Zone and ownership scope of a target specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetScope {
    /// The ability's own card
    #[serde(rename = "SELF")]
    SelfCard,
    YourLeader,
    YourCharacter,
    YourLeaderOrCharacter,
    OpponentLeader,
    OpponentCharacter,
    OpponentLeaderOrCharacter,
    AnyLeader,
    AnyCharacter,
    YourHand,
    YourTrash,
    /// Top cards of your deck (count comes from the action value)
    YourDeckTop,
}

/// What an action targets and how many
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub scope: TargetScope,
    /// Minimum selections ("up to" when zero)
    #[serde(default)]
    pub min: usize,
    #[serde(default = "default_max")]
    pub max: usize,
    /// Every candidate is affected, no selection needed
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

fn default_max() -> usize {
    1
}

impl TargetSpec {
    pub fn new(scope: TargetScope) -> Self {
        TargetSpec {
            scope,
            min: 0,
            max: 1,
            all: false,
            filters: Vec::new(),
        }
    }

    /// Needs no player choice
    pub fn auto_resolves(&self) -> bool {
        self.all || self.scope == TargetScope::SelfCard
    }
}

/// Costs of an ability
///
/// Unlike rule keywords, costs are strict: an unknown cost type fails the
/// card at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbilityCost {
    /// Rest active DON in the cost area
    RestDon {
        #[serde(default = "default_count")]
        count: u32,
    },
    /// Return DON from the field to the DON deck
    ReturnDon {
        #[serde(default = "default_count")]
        count: u32,
    },
    TrashFromHand {
        #[serde(default = "default_count")]
        count: u32,
        #[serde(default)]
        filters: Vec<Filter>,
    },
    /// Top life card to hand
    PayLife {
        #[serde(default = "default_count")]
        count: u32,
    },
    RestSelf,
    TrashSelf,
}

fn default_count() -> u32 {
    1
}

impl AbilityCost {
    /// Does paying this cost need a card selection?
    pub fn needs_selection(&self) -> bool {
        matches!(self, AbilityCost::TrashFromHand { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            AbilityCost::RestDon { count } => format!("rest {count} DON"),
            AbilityCost::ReturnDon { count } => format!("return {count} DON"),
            AbilityCost::TrashFromHand { count, .. } => format!("trash {count} card(s) from hand"),
            AbilityCost::PayLife { count } => format!("add {count} life card(s) to hand"),
            AbilityCost::RestSelf => "rest this card".to_string(),
            AbilityCost::TrashSelf => "trash this card".to_string(),
        }
    }
}
