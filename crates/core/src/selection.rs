//! Card selection engine: drives a single queue entry from deck to selection.
//!
//! The engine never performs IO. Deck fetches are handed out as
//! [`DeckRequest`]s and come back through [`SelectionEngine::resolve_deck`];
//! every `load_entry` bumps the generation so a late response for an entry the
//! user already left is recognised and dropped.
//!
//! User races (double flips, flips before the deck arrives, flips past the
//! limit, reshuffles after a reveal) are no-ops, not errors.

use crate::{
    Deck, DeckCard, DeckProvider, DeckPurpose, DeckRequest, DeckResponse, DeckTicket, Event,
    EventBus, ProviderError, QueueEntry, Reading,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    /// No entry loaded.
    Idle,
    AwaitingDeck,
    Drawing,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckResolution {
    Applied,
    Stale,
    Failed(ProviderError),
}

#[derive(Debug, Default)]
pub struct SelectionEngine {
    entry: Option<QueueEntry>,
    deck: Option<Deck>,
    selected: Vec<usize>,
    flipped: BTreeSet<usize>,
    has_revealed_any: bool,
    deck_in_flight: bool,
    reshuffle_in_flight: bool,
    generation: u64,
    last_error: Option<ProviderError>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an entry and, when available, its deck. A missing entry leaves
    /// the engine empty instead of failing.
    pub fn load_entry(
        &mut self,
        entry: Option<QueueEntry>,
        deck: Option<Deck>,
        events: &mut EventBus,
    ) {
        self.generation += 1;
        self.selected.clear();
        self.flipped.clear();
        self.has_revealed_any = false;
        self.deck_in_flight = false;
        self.reshuffle_in_flight = false;
        self.last_error = None;

        let Some(entry) = entry else {
            tracing::debug!(generation = self.generation, "selection reset without entry");
            self.entry = None;
            self.deck = None;
            return;
        };

        self.deck = deck.filter(|deck| {
            let matches = deck.oracle() == entry.oracle_type;
            if !matches {
                tracing::warn!(
                    expected = %entry.oracle_type,
                    actual = %deck.oracle(),
                    "ignoring deck dealt for another oracle"
                );
            }
            matches
        });
        tracing::debug!(
            generation = self.generation,
            key = %entry.key(),
            deck_ready = self.deck.is_some(),
            "entry loaded"
        );
        events.push(Event::EntryLoaded {
            oracle: entry.oracle_type,
            method: entry.method,
            deck_ready: self.deck.is_some(),
        });
        self.entry = Some(entry);
    }

    /// Ask for the current entry's deck when it has none and no fetch is out.
    pub fn request_deck(&mut self) -> Option<DeckRequest> {
        let entry = self.entry.as_ref()?;
        if self.deck.is_some() || self.deck_in_flight {
            return None;
        }
        let request = DeckRequest {
            ticket: DeckTicket {
                generation: self.generation,
                purpose: DeckPurpose::Initial,
            },
            oracle_type: entry.oracle_type,
            spread_code: entry.spread_code.clone(),
        };
        self.deck_in_flight = true;
        Some(request)
    }

    /// Turn a deck position face up. Returns whether anything changed.
    pub fn flip(&mut self, position: usize, events: &mut EventBus) -> bool {
        let (Some(entry), Some(deck)) = (self.entry.as_ref(), self.deck.as_ref()) else {
            return false;
        };
        if self.reshuffle_in_flight || position >= deck.len() {
            return false;
        }
        let oracle = entry.oracle_type;

        if entry.method.is_full_reveal() {
            if self.has_revealed_any {
                return false;
            }
            let total = deck.len();
            self.selected = (0..total).collect();
            self.flipped = (0..total).collect();
            self.has_revealed_any = true;
            tracing::debug!(position, total, "tableau revealed");
            events.push(Event::CardFlipped { oracle, position });
            events.push(Event::TableauRevealed { cards: total });
            return true;
        }

        if self.flipped.contains(&position) || self.selected.len() >= entry.cards_needed() {
            return false;
        }
        self.selected.push(position);
        self.flipped.insert(position);
        self.has_revealed_any = true;
        tracing::debug!(
            position,
            selected = self.selected.len(),
            needed = entry.cards_needed(),
            "card flipped"
        );
        events.push(Event::CardFlipped { oracle, position });
        true
    }

    /// Start a reshuffle. `None` once any card is revealed or while another
    /// fetch is outstanding.
    pub fn begin_reshuffle(&mut self) -> Option<DeckRequest> {
        if !self.can_reshuffle() {
            return None;
        }
        let entry = self.entry.as_ref()?;
        let request = DeckRequest {
            ticket: DeckTicket {
                generation: self.generation,
                purpose: DeckPurpose::Reshuffle,
            },
            oracle_type: entry.oracle_type,
            spread_code: entry.spread_code.clone(),
        };
        self.reshuffle_in_flight = true;
        Some(request)
    }

    /// Apply a provider answer. Failures keep the previous deck and selection.
    pub fn resolve_deck(
        &mut self,
        ticket: DeckTicket,
        result: Result<DeckResponse, ProviderError>,
        events: &mut EventBus,
    ) -> DeckResolution {
        let outstanding = match ticket.purpose {
            DeckPurpose::Initial => self.deck_in_flight,
            DeckPurpose::Reshuffle => self.reshuffle_in_flight,
        };
        if ticket.generation != self.generation || !outstanding {
            tracing::warn!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale deck response"
            );
            events.push(Event::StaleDeckDiscarded {
                generation: ticket.generation,
            });
            return DeckResolution::Stale;
        }
        match ticket.purpose {
            DeckPurpose::Initial => self.deck_in_flight = false,
            DeckPurpose::Reshuffle => self.reshuffle_in_flight = false,
        }
        let Some(entry) = self.entry.as_ref() else {
            return DeckResolution::Stale;
        };
        let oracle = entry.oracle_type;
        let reshuffle = ticket.purpose == DeckPurpose::Reshuffle;

        let result = result.and_then(|response| {
            if response.deck.oracle() == oracle {
                Ok(response)
            } else {
                Err(ProviderError::Malformed(format!(
                    "expected a {oracle} deck, got {}",
                    response.deck.oracle()
                )))
            }
        });

        match result {
            Ok(response) => {
                if let Some(code) = response
                    .spread_code
                    .as_deref()
                    .filter(|code| *code != entry.spread_code)
                {
                    tracing::debug!(
                        requested = %entry.spread_code,
                        returned = code,
                        "provider returned a different spread code; keeping the entry's"
                    );
                }
                let cards = response.deck.len();
                self.deck = Some(response.deck);
                self.selected.clear();
                self.flipped.clear();
                self.has_revealed_any = false;
                self.last_error = None;
                events.push(Event::DeckApplied {
                    oracle,
                    cards,
                    reshuffle,
                });
                DeckResolution::Applied
            }
            Err(err) => {
                tracing::warn!(%oracle, reshuffle, "deck request failed: {err}");
                events.push(Event::DeckFailed {
                    oracle,
                    reason: err.to_string(),
                    reshuffle,
                });
                self.last_error = Some(err.clone());
                DeckResolution::Failed(err)
            }
        }
    }

    /// Fetch the initial deck synchronously. `None` when no fetch is needed.
    pub fn load_deck_from(
        &mut self,
        provider: &mut dyn DeckProvider,
        events: &mut EventBus,
    ) -> Option<DeckResolution> {
        let request = self.request_deck()?;
        let result = provider.fetch_deck(&request);
        Some(self.resolve_deck(request.ticket, result, events))
    }

    /// Reshuffle synchronously. `None` when the reshuffle is not allowed.
    pub fn reshuffle(
        &mut self,
        provider: &mut dyn DeckProvider,
        events: &mut EventBus,
    ) -> Option<DeckResolution> {
        let request = self.begin_reshuffle()?;
        let result = provider.fetch_deck(&request);
        Some(self.resolve_deck(request.ticket, result, events))
    }

    pub fn can_complete(&self) -> bool {
        let (Some(entry), Some(_)) = (self.entry.as_ref(), self.deck.as_ref()) else {
            return false;
        };
        if entry.method.is_full_reveal() {
            return self.has_revealed_any;
        }
        let needed = entry.cards_needed();
        needed > 0 && self.selected.len() == needed
    }

    /// Final ordered positions, in reveal order. `None` until complete.
    pub fn complete(&self) -> Option<Vec<usize>> {
        if !self.can_complete() {
            return None;
        }
        Some(self.selected.clone())
    }

    /// Completed selection paired with its cards, for interpretation.
    pub fn reading(&self) -> Option<Reading> {
        let positions = self.complete()?;
        let entry = self.entry.as_ref()?;
        let deck = self.deck.as_ref()?;
        Some(Reading::from_selection(entry, deck, &positions))
    }

    pub fn can_reshuffle(&self) -> bool {
        self.entry.is_some()
            && self.deck.is_some()
            && !self.has_revealed_any
            && !self.reshuffle_in_flight
            && !self.deck_in_flight
    }

    pub fn status(&self) -> SelectionStatus {
        if self.entry.is_none() {
            SelectionStatus::Idle
        } else if self.deck.is_none() {
            SelectionStatus::AwaitingDeck
        } else if self.can_complete() {
            SelectionStatus::Ready
        } else {
            SelectionStatus::Drawing
        }
    }

    /// Flips still needed before the entry can complete.
    pub fn remaining(&self) -> usize {
        let Some(entry) = self.entry.as_ref() else {
            return 0;
        };
        if entry.method.is_full_reveal() {
            return usize::from(!self.has_revealed_any);
        }
        entry.cards_needed().saturating_sub(self.selected.len())
    }

    pub fn entry(&self) -> Option<&QueueEntry> {
        self.entry.as_ref()
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn selected_cards(&self) -> Vec<(usize, &DeckCard)> {
        let Some(deck) = self.deck.as_ref() else {
            return Vec::new();
        };
        self.selected
            .iter()
            .filter_map(|&position| deck.get(position).map(|card| (position, card)))
            .collect()
    }

    pub fn is_flipped(&self, position: usize) -> bool {
        self.flipped.contains(&position)
    }

    pub fn flipped_count(&self) -> usize {
        self.flipped.len()
    }

    pub fn has_revealed_any(&self) -> bool {
        self.has_revealed_any
    }

    pub fn deck_in_flight(&self) -> bool {
        self.deck_in_flight
    }

    pub fn reshuffle_in_flight(&self) -> bool {
        self.reshuffle_in_flight
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, OracleType};

    fn loaded(method: Method) -> (SelectionEngine, EventBus) {
        let mut events = EventBus::default();
        let mut engine = SelectionEngine::new();
        let entry = QueueEntry::new(method);
        let deck = Deck::unshuffled(entry.oracle_type);
        engine.load_entry(Some(entry), Some(deck), &mut events);
        (engine, events)
    }

    #[test]
    fn missing_entry_yields_empty_state() {
        let mut events = EventBus::default();
        let mut engine = SelectionEngine::new();
        engine.load_entry(None, Some(Deck::unshuffled(OracleType::Tarot)), &mut events);
        assert_eq!(engine.status(), SelectionStatus::Idle);
        assert!(!engine.flip(0, &mut events));
        assert!(engine.request_deck().is_none());
        assert!(events.is_empty());
    }

    #[test]
    fn flips_wait_for_a_deck() {
        let mut events = EventBus::default();
        let mut engine = SelectionEngine::new();
        engine.load_entry(Some(QueueEntry::new(Method::TresPpp)), None, &mut events);
        assert_eq!(engine.status(), SelectionStatus::AwaitingDeck);
        assert!(!engine.flip(3, &mut events));
        assert!(engine.selected().is_empty());
    }

    #[test]
    fn deck_for_another_oracle_is_not_installed() {
        let mut events = EventBus::default();
        let mut engine = SelectionEngine::new();
        engine.load_entry(
            Some(QueueEntry::new(Method::TresPpp)),
            Some(Deck::unshuffled(OracleType::Lenormand)),
            &mut events,
        );
        assert!(engine.deck().is_none());
    }

    #[test]
    fn out_of_range_flip_is_ignored() {
        let (mut engine, mut events) = loaded(Method::LinhaDeTres);
        assert!(!engine.flip(36, &mut events));
        assert!(!engine.has_revealed_any());
    }

    #[test]
    fn flips_are_ignored_while_reshuffle_is_in_flight() {
        let (mut engine, mut events) = loaded(Method::TresPpp);
        let request = engine.begin_reshuffle().unwrap();
        assert!(engine.begin_reshuffle().is_none());
        assert!(!engine.flip(1, &mut events));
        let resolution = engine.resolve_deck(
            request.ticket,
            Err(ProviderError::Unavailable("offline".to_string())),
            &mut events,
        );
        assert!(matches!(resolution, DeckResolution::Failed(_)));
        assert!(engine.flip(1, &mut events));
    }

    #[test]
    fn late_response_for_previous_entry_is_discarded() {
        let mut events = EventBus::default();
        let mut engine = SelectionEngine::new();
        engine.load_entry(Some(QueueEntry::new(Method::TresPpp)), None, &mut events);
        let first = engine.request_deck().unwrap();
        engine.load_entry(Some(QueueEntry::new(Method::GrandTableau)), None, &mut events);
        let second = engine.request_deck().unwrap();

        let late = DeckResponse {
            deck: Deck::unshuffled(OracleType::Tarot),
            spread_code: None,
        };
        assert_eq!(
            engine.resolve_deck(first.ticket, Ok(late), &mut events),
            DeckResolution::Stale
        );
        assert!(engine.deck().is_none());

        let fresh = DeckResponse {
            deck: Deck::unshuffled(OracleType::Lenormand),
            spread_code: None,
        };
        assert_eq!(
            engine.resolve_deck(second.ticket, Ok(fresh), &mut events),
            DeckResolution::Applied
        );
        assert_eq!(engine.deck().map(Deck::len), Some(36));
    }

    #[test]
    fn failed_initial_fetch_can_be_retried() {
        let mut events = EventBus::default();
        let mut engine = SelectionEngine::new();
        engine.load_entry(Some(QueueEntry::new(Method::CartaUnica)), None, &mut events);
        let request = engine.request_deck().unwrap();
        assert!(engine.request_deck().is_none());
        engine.resolve_deck(request.ticket, Err(ProviderError::EmptyDeck), &mut events);
        assert_eq!(engine.last_error(), Some(&ProviderError::EmptyDeck));
        engine.dismiss_error();
        assert!(engine.last_error().is_none());
        assert!(engine.request_deck().is_some());
    }

    #[test]
    fn returned_spread_code_does_not_rewrite_the_entry() {
        let (mut engine, mut events) = loaded(Method::CruzCelta);
        let request = engine.begin_reshuffle().unwrap();
        let response = DeckResponse {
            deck: Deck::unshuffled(OracleType::Tarot),
            spread_code: Some("cruz_celta_alt".to_string()),
        };
        engine.resolve_deck(request.ticket, Ok(response), &mut events);
        assert_eq!(engine.entry().map(|e| e.spread_code.as_str()), Some("cruz_celta"));
    }

    #[test]
    fn remaining_counts_down() {
        let (mut engine, mut events) = loaded(Method::CruzSimples);
        assert_eq!(engine.remaining(), 5);
        engine.flip(8, &mut events);
        engine.flip(9, &mut events);
        assert_eq!(engine.remaining(), 3);
        let (mut tableau, mut events) = loaded(Method::GrandTableau);
        assert_eq!(tableau.remaining(), 1);
        tableau.flip(0, &mut events);
        assert_eq!(tableau.remaining(), 0);
    }
}
