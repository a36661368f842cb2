//! Core game types and entities

pub mod buff;
pub mod card;
pub mod entity;
pub mod keyword;
pub mod player;
pub mod types;

pub use buff::{combat_power, Duration, PowerBuff};
pub use card::{CardState, GameCard, KeywordGrant, Restriction, RestrictionKind};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use keyword::Keyword;
pub use player::PlayerState;
pub use types::{normalize_name, CardCategory, CardName, Color, Comparison, DefinitionId, PlayerName};

/// Card instance id
pub type CardId = EntityId<GameCard>;

/// Player id (0 or 1)
pub type PlayerId = EntityId<PlayerState>;
