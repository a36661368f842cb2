//! Card abilities: definitions, registries and resolution

pub mod condition;
pub mod continuous;
pub mod definition;
pub mod engine;
pub mod filter;
pub mod trigger;

pub use condition::{Condition, Whose};
pub use definition::{
    AbilityCost, CardDefinition, CardEffectDefinition, CardLookup, EffectAction, EffectKind,
    TargetScope, TargetSpec,
};
pub use engine::{EffectEngine, TriggeredAbility};
pub use filter::{Filter, FilterContext};
pub use trigger::{GameEvent, TriggerKind};
