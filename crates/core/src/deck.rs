use crate::{catalog, DeckCard, OracleType, Orientation, RngState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("deck is empty")]
    Empty,
    #[error("{oracle} deck must hold {expected} cards, got {actual}")]
    WrongSize {
        oracle: OracleType,
        expected: usize,
        actual: usize,
    },
}

/// Ordered cards dealt for one queue entry. Replaced wholesale, never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    oracle: OracleType,
    cards: Vec<DeckCard>,
}

impl Deck {
    /// Validates the size. Oracles without reversals get every card upright.
    pub fn new(oracle: OracleType, mut cards: Vec<DeckCard>) -> Result<Self, DeckError> {
        if cards.is_empty() {
            return Err(DeckError::Empty);
        }
        let expected = oracle.total_cards();
        if cards.len() != expected {
            return Err(DeckError::WrongSize {
                oracle,
                expected,
                actual: cards.len(),
            });
        }
        if !oracle.supports_reversal() {
            for card in &mut cards {
                card.orientation = Orientation::Upright;
            }
        }
        Ok(Self { oracle, cards })
    }

    /// Catalog order, every card upright.
    pub fn unshuffled(oracle: OracleType) -> Self {
        let cards = catalog(oracle).into_iter().map(DeckCard::upright).collect();
        Self { oracle, cards }
    }

    /// Fresh random deck. Reversals are only dealt for oracles that support them.
    pub fn shuffled(oracle: OracleType, rng: &mut RngState, reversal_chance: f64) -> Self {
        let mut cards: Vec<DeckCard> = catalog(oracle).into_iter().map(DeckCard::upright).collect();
        rng.shuffle(&mut cards);
        if oracle.supports_reversal() {
            for card in &mut cards {
                if rng.chance(reversal_chance) {
                    card.orientation = Orientation::Reversed;
                }
            }
        }
        Self { oracle, cards }
    }

    pub fn oracle(&self) -> OracleType {
        self.oracle
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&DeckCard> {
        self.cards.get(position)
    }

    pub fn cards(&self) -> &[DeckCard] {
        &self.cards
    }
}
