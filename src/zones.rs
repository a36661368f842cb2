//! Game zones (Deck, Hand, Field, Trash, Life, ...)

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};

/// Different zones where cards can exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Deck,
    Hand,
    /// Character area
    Field,
    Trash,
    Life,
    Leader,
    Stage,
    DonDeck,
    /// DON available to pay costs (active or rested)
    CostArea,
    /// DON attached to a leader or character
    Attached,
}

impl Zone {
    pub const ALL: [Zone; 10] = [
        Zone::Deck,
        Zone::Hand,
        Zone::Field,
        Zone::Trash,
        Zone::Life,
        Zone::Leader,
        Zone::Stage,
        Zone::DonDeck,
        Zone::CostArea,
        Zone::Attached,
    ];

    /// Zones whose contents are public to both players
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Zone::Field | Zone::Trash | Zone::Leader | Zone::Stage | Zone::CostArea | Zone::Attached
        )
    }
}

/// A zone containing cards
///
/// Order is meaningful for every zone: the top of Deck and Life is the last
/// element, and Hand/Field order is kept stable for deterministic iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardZone {
    /// Zone type
    pub zone_type: Zone,

    /// Owner of this zone (each player has their own zones)
    pub owner: PlayerId,

    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(zone_type: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone_type,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    pub fn remove(&mut self, card_id: CardId) -> bool {
        if let Some(pos) = self.cards.iter().position(|&id| id == card_id) {
            // remove() keeps order stable; swap_remove() would reorder iteration
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Take the top card
    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    /// Look at top card without removing it
    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    /// The top `n` cards, topmost first
    pub fn top(&self, n: usize) -> Vec<CardId> {
        self.cards.iter().rev().take(n).copied().collect()
    }

    pub fn add_to_bottom(&mut self, card_id: CardId) {
        self.cards.insert(0, card_id);
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

/// Collection of all zones for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerZones {
    pub deck: CardZone,
    pub hand: CardZone,
    pub field: CardZone,
    pub trash: CardZone,
    pub life: CardZone,
    pub leader: CardZone,
    pub stage: CardZone,
    pub don_deck: CardZone,
    pub cost_area: CardZone,
    pub attached: CardZone,
}

impl PlayerZones {
    pub fn new(player_id: PlayerId) -> Self {
        PlayerZones {
            deck: CardZone::new(Zone::Deck, player_id),
            hand: CardZone::new(Zone::Hand, player_id),
            field: CardZone::new(Zone::Field, player_id),
            trash: CardZone::new(Zone::Trash, player_id),
            life: CardZone::new(Zone::Life, player_id),
            leader: CardZone::new(Zone::Leader, player_id),
            stage: CardZone::new(Zone::Stage, player_id),
            don_deck: CardZone::new(Zone::DonDeck, player_id),
            cost_area: CardZone::new(Zone::CostArea, player_id),
            attached: CardZone::new(Zone::Attached, player_id),
        }
    }

    pub fn get_zone(&self, zone: Zone) -> &CardZone {
        match zone {
            Zone::Deck => &self.deck,
            Zone::Hand => &self.hand,
            Zone::Field => &self.field,
            Zone::Trash => &self.trash,
            Zone::Life => &self.life,
            Zone::Leader => &self.leader,
            Zone::Stage => &self.stage,
            Zone::DonDeck => &self.don_deck,
            Zone::CostArea => &self.cost_area,
            Zone::Attached => &self.attached,
        }
    }

    pub fn get_zone_mut(&mut self, zone: Zone) -> &mut CardZone {
        match zone {
            Zone::Deck => &mut self.deck,
            Zone::Hand => &mut self.hand,
            Zone::Field => &mut self.field,
            Zone::Trash => &mut self.trash,
            Zone::Life => &mut self.life,
            Zone::Leader => &mut self.leader,
            Zone::Stage => &mut self.stage,
            Zone::DonDeck => &mut self.don_deck,
            Zone::CostArea => &mut self.cost_area,
            Zone::Attached => &mut self.attached,
        }
    }

    /// Leader and characters: the cards that can attack, block and hold DON
    pub fn battlers(&self) -> impl Iterator<Item = CardId> + '_ {
        self.leader.cards.iter().chain(self.field.cards.iter()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_zone() {
        let player_id = PlayerId::new(1);
        let mut zone = CardZone::new(Zone::Hand, player_id);

        assert_eq!(zone.len(), 0);
        assert!(zone.is_empty());

        let card1 = CardId::new(10);
        let card2 = CardId::new(11);

        zone.add(card1);
        zone.add(card2);
        assert_eq!(zone.len(), 2);
        assert!(zone.contains(card1));

        assert!(zone.remove(card1));
        assert!(!zone.contains(card1));
        assert!(!zone.remove(card1));
        assert_eq!(zone.len(), 1);
    }

    #[test]
    fn test_deck_top_and_bottom() {
        let mut deck = CardZone::new(Zone::Deck, PlayerId::new(0));
        deck.add(CardId::new(1));
        deck.add(CardId::new(2));
        deck.add(CardId::new(3));
        deck.add_to_bottom(CardId::new(4));

        assert_eq!(deck.peek_top(), Some(CardId::new(3)));
        assert_eq!(deck.top(2), vec![CardId::new(3), CardId::new(2)]);
        assert_eq!(deck.draw_top(), Some(CardId::new(3)));
        assert_eq!(deck.cards[0], CardId::new(4));
    }

    #[test]
    fn test_player_zones_lookup() {
        let mut zones = PlayerZones::new(PlayerId::new(0));
        zones.get_zone_mut(Zone::Life).add(CardId::new(7));
        assert_eq!(zones.life.len(), 1);
        assert_eq!(zones.get_zone(Zone::Life).peek_top(), Some(CardId::new(7)));
        assert!(Zone::Trash.is_public());
        assert!(!Zone::Life.is_public());
    }
}
