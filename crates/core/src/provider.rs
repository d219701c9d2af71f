//! Deck provider contract.
//!
//! A provider turns `(oracle, spread code)` into a freshly randomized deck.
//! Requests carry a [`DeckTicket`] so a response can be matched to the entry
//! that asked for it; the selection engine drops responses for stale tickets.

use crate::{Deck, DeckCard, DeckError, OracleType, Orientation, RngState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_REVERSAL_CHANCE: f64 = 0.5;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("deck provider unavailable: {0}")]
    Unavailable(String),
    #[error("deck provider returned an empty deck")]
    EmptyDeck,
    #[error("deck provider returned {actual} cards, expected {expected}")]
    DeckSize { expected: usize, actual: usize },
    #[error("malformed deck payload: {0}")]
    Malformed(String),
}

impl From<DeckError> for ProviderError {
    fn from(value: DeckError) -> Self {
        match value {
            DeckError::Empty => Self::EmptyDeck,
            DeckError::WrongSize {
                expected, actual, ..
            } => Self::DeckSize { expected, actual },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeckPurpose {
    Initial,
    Reshuffle,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckTicket {
    pub generation: u64,
    pub purpose: DeckPurpose,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckRequest {
    pub ticket: DeckTicket,
    pub oracle_type: OracleType,
    pub spread_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckResponse {
    pub deck: Deck,
    pub spread_code: Option<String>,
}

/// One card as providers send it. Three spellings of the same orientation fact
/// are accepted here and nowhere else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDeckCard {
    pub code: String,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub reversed: Option<bool>,
    #[serde(default)]
    pub is_reversed: Option<bool>,
}

impl RawDeckCard {
    pub fn normalize(self) -> Result<DeckCard, ProviderError> {
        if self.code.trim().is_empty() {
            return Err(ProviderError::Malformed("card without code".to_string()));
        }
        let orientation = match self.orientation.as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("reversed") => Orientation::Reversed,
            Some(value) if value.eq_ignore_ascii_case("invertida") => Orientation::Reversed,
            Some(value) if value.eq_ignore_ascii_case("upright") => Orientation::Upright,
            Some(value) if value.is_empty() => Orientation::Upright,
            Some(other) => {
                return Err(ProviderError::Malformed(format!(
                    "unknown orientation `{other}` for {}",
                    self.code
                )))
            }
            None => {
                if self.reversed.or(self.is_reversed).unwrap_or(false) {
                    Orientation::Reversed
                } else {
                    Orientation::Upright
                }
            }
        };
        Ok(DeckCard {
            code: self.code,
            orientation,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDeckResponse {
    #[serde(default)]
    pub deck: Vec<RawDeckCard>,
    #[serde(default, alias = "spreadCode")]
    pub spread_code: Option<String>,
}

impl RawDeckResponse {
    pub fn normalize(self, oracle: OracleType) -> Result<DeckResponse, ProviderError> {
        if self.deck.is_empty() {
            return Err(ProviderError::EmptyDeck);
        }
        let cards = self
            .deck
            .into_iter()
            .map(RawDeckCard::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        let deck = Deck::new(oracle, cards)?;
        Ok(DeckResponse {
            deck,
            spread_code: self.spread_code,
        })
    }
}

pub trait DeckProvider {
    fn fetch_deck(&mut self, request: &DeckRequest) -> Result<DeckResponse, ProviderError>;
}

impl<P: DeckProvider + ?Sized> DeckProvider for Box<P> {
    fn fetch_deck(&mut self, request: &DeckRequest) -> Result<DeckResponse, ProviderError> {
        (**self).fetch_deck(request)
    }
}

/// Local provider: shuffles the oracle's catalog with a seeded rng.
#[derive(Debug, Clone)]
pub struct ShuffledDeckProvider {
    rng: RngState,
    reversal_chance: f64,
}

impl ShuffledDeckProvider {
    pub fn new(seed: u64) -> Self {
        Self::with_reversal_chance(seed, DEFAULT_REVERSAL_CHANCE)
    }

    pub fn with_reversal_chance(seed: u64, reversal_chance: f64) -> Self {
        Self {
            rng: RngState::from_seed(seed),
            reversal_chance,
        }
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }
}

impl DeckProvider for ShuffledDeckProvider {
    fn fetch_deck(&mut self, request: &DeckRequest) -> Result<DeckResponse, ProviderError> {
        let deck = Deck::shuffled(request.oracle_type, &mut self.rng, self.reversal_chance);
        Ok(DeckResponse {
            deck,
            spread_code: None,
        })
    }
}
