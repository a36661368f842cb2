//! Sanitized per-player projection of the game state
//!
//! The opponent's hand, both decks and every face-down life card are
//! replaced by `CardSlot::Hidden`, keeping counts and positions. Pending
//! effect candidates, and the cards a deck reveal shows, are only listed
//! for the player who must answer.

use crate::core::{CardCategory, CardId, CardState, Keyword, PlayerId};
use crate::game::{CombatInfo, GameState, PendingEffect, Phase};
use crate::zones::CardZone;
use crate::Result;
use serde::{Deserialize, Serialize};

/// A visible card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: CardId,
    pub definition: String,
    pub name: String,
    pub category: CardCategory,
    pub owner: PlayerId,
    pub state: CardState,
    /// Effective power right now (may be negative)
    pub power: i32,
    pub cost: i32,
    pub counter: i32,
    pub attached_don: u32,
    pub keywords: Vec<String>,
}

/// One position in a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardSlot {
    Visible(CardView),
    Hidden,
}

impl CardSlot {
    pub fn is_hidden(&self) -> bool {
        matches!(self, CardSlot::Hidden)
    }
}

/// One player's side of the table as seen by the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub leader: Option<CardView>,
    pub hand: Vec<CardSlot>,
    pub deck: Vec<CardSlot>,
    pub life: Vec<CardSlot>,
    pub field: Vec<CardView>,
    pub stage: Option<CardView>,
    pub trash: Vec<CardView>,
    pub don_deck: usize,
    pub active_don: usize,
    pub rested_don: usize,
    pub turns_taken: u32,
}

/// The blocking question, as much of it as the viewer may see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingView {
    pub phase: Phase,
    pub player: PlayerId,
    pub source: CardId,
    pub description: String,
    /// Empty unless the viewer is the answering player
    pub candidates: Vec<CardId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Deck cards shown to the answering player during a deck reveal
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revealed: Vec<CardView>,
}

/// Everything one player is allowed to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: String,
    pub viewer: PlayerId,
    pub phase: Phase,
    pub turn: u32,
    pub active_player: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combat: Option<CombatInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingView>,
    pub you: PlayerView,
    pub opponent: PlayerView,
}

impl GameView {
    /// Project `state` for `viewer`
    pub fn for_player(state: &GameState, viewer: PlayerId) -> Result<Self> {
        state.player(viewer)?;
        let opponent = state.opponent_of(viewer);
        let pending = state
            .pending
            .as_ref()
            .map(|p| pending_view(state, p, viewer))
            .transpose()?;

        Ok(GameView {
            game_id: state.game_id.clone(),
            viewer,
            phase: state.phase,
            turn: state.turn,
            active_player: state.active_player,
            winner: state.winner,
            combat: state.combat.clone(),
            pending,
            you: side(state, viewer, true)?,
            opponent: side(state, opponent, false)?,
        })
    }
}

fn pending_view(state: &GameState, pending: &PendingEffect, viewer: PlayerId) -> Result<PendingView> {
    let answering = pending.player() == viewer;
    let candidates = if answering { pending.candidates() } else { Vec::new() };
    let options = match pending {
        PendingEffect::Choice(r) if answering => r.options.clone(),
        _ => Vec::new(),
    };
    let revealed = match pending {
        PendingEffect::DeckReveal(_) => candidates
            .iter()
            .map(|id| card_view(state, *id))
            .collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    Ok(PendingView {
        phase: pending.phase(),
        player: pending.player(),
        source: pending.source(),
        description: pending.description().to_string(),
        candidates,
        options,
        revealed,
    })
}

fn side(state: &GameState, player: PlayerId, own: bool) -> Result<PlayerView> {
    let p = state.player(player)?;
    let zones = &p.zones;
    let visible = |zone: &CardZone| -> Result<Vec<CardView>> {
        zone.cards.iter().map(|id| card_view(state, *id)).collect()
    };
    let hidden = |zone: &CardZone| vec![CardSlot::Hidden; zone.len()];

    let hand = if own {
        visible(&zones.hand)?
            .into_iter()
            .map(CardSlot::Visible)
            .collect()
    } else {
        hidden(&zones.hand)
    };
    let life = zones
        .life
        .cards
        .iter()
        .map(|id| {
            if state.card(*id)?.face_up {
                Ok(CardSlot::Visible(card_view(state, *id)?))
            } else {
                Ok(CardSlot::Hidden)
            }
        })
        .collect::<Result<Vec<_>>>()?;
    let rested_don = zones
        .cost_area
        .cards
        .iter()
        .filter(|id| state.card(**id).is_ok_and(|c| c.is_rested()))
        .count();

    Ok(PlayerView {
        id: player,
        name: p.name.as_str().to_string(),
        leader: p.leader().map(|id| card_view(state, id)).transpose()?,
        hand,
        deck: hidden(&zones.deck),
        life,
        field: visible(&zones.field)?,
        stage: zones.stage.peek_top().map(|id| card_view(state, id)).transpose()?,
        trash: visible(&zones.trash)?,
        don_deck: zones.don_deck.len(),
        active_don: zones.cost_area.len() - rested_don,
        rested_don,
        turns_taken: p.turns_taken,
    })
}

fn card_view(state: &GameState, id: CardId) -> Result<CardView> {
    let card = state.card(id)?;
    let mut keywords: Vec<Keyword> = Vec::new();
    let candidates = card
        .base_keywords
        .iter()
        .chain(card.temporary_keywords.iter())
        .chain(card.continuous_keywords.iter())
        .chain(card.granted_keywords.iter().map(|g| &g.keyword));
    for keyword in candidates {
        if card.has_keyword(keyword, state.turn) && !keywords.contains(keyword) {
            keywords.push(keyword.clone());
        }
    }

    Ok(CardView {
        id,
        definition: card.definition.as_str().to_string(),
        name: card.name.as_str().to_string(),
        category: card.category,
        owner: card.owner,
        state: card.state,
        power: state.power_of(id)?,
        cost: card.effective_cost(),
        counter: card.counter,
        attached_don: state.attached_don(id),
        keywords: keywords.into_iter().map(String::from).collect(),
    })
}
