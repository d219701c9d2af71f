use crate::{label, Deck, Method, OracleType, Orientation, QueueEntry};
use serde::{Deserialize, Serialize};

/// A completed draw, shaped for the interpretation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub oracle_type: OracleType,
    pub method: Method,
    pub spread_code: String,
    pub cards: Vec<ReadingCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingCard {
    pub role: String,
    pub deck_position: usize,
    pub code: String,
    pub orientation: Orientation,
    pub label: String,
}

impl Reading {
    /// `positions` in reveal order; the n-th revealed card takes the n-th role.
    pub fn from_selection(entry: &QueueEntry, deck: &Deck, positions: &[usize]) -> Self {
        let cards = positions
            .iter()
            .enumerate()
            .filter_map(|(slot, &position)| {
                let card = deck.get(position)?;
                Some(ReadingCard {
                    role: entry.method.position_role(slot),
                    deck_position: position,
                    code: card.code.clone(),
                    orientation: card.orientation,
                    label: label(entry.oracle_type, &card.code, card.is_reversed()),
                })
            })
            .collect();
        Self {
            oracle_type: entry.oracle_type,
            method: entry.method,
            spread_code: entry.spread_code.clone(),
            cards,
        }
    }

    pub fn key(&self) -> String {
        format!("{}_{}", self.oracle_type.as_str(), self.method.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_reveal_order() {
        let entry = QueueEntry::new(Method::TresPpp);
        let deck = Deck::unshuffled(OracleType::Tarot);
        let reading = Reading::from_selection(&entry, &deck, &[21, 1, 0]);
        let roles: Vec<_> = reading.cards.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, ["Passado", "Presente", "Futuro"]);
        assert_eq!(reading.cards[0].code, "tarot_major_21_world");
        assert_eq!(reading.cards[1].label, "O Mago");
        assert_eq!(reading.key(), "tarot_tres_ppp");
    }
}
