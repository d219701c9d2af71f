use crate::{
    AdvanceOutcome, DeckProvider, DeckResolution, Event, EventBus, OracleQueue, QueueEntry,
    Reading, SelectionEngine,
};
use std::collections::BTreeMap;

/// Synchronous driver: one queue, one engine, one provider.
///
/// Interactive shells talk to the engine and queue directly so deck fetches
/// can run in the background; this type is for callers that can block.
#[derive(Debug)]
pub struct Consultation<P> {
    queue: OracleQueue,
    engine: SelectionEngine,
    provider: P,
    events: EventBus,
    readings: Vec<Reading>,
    outcome: Option<BTreeMap<String, Vec<usize>>>,
}

impl<P: DeckProvider> Consultation<P> {
    pub fn new(entries: Vec<QueueEntry>, provider: P) -> Self {
        Self {
            queue: OracleQueue::new(entries),
            engine: SelectionEngine::new(),
            provider,
            events: EventBus::default(),
            readings: Vec::new(),
            outcome: None,
        }
    }

    /// Load the entry under the cursor and fetch its deck.
    pub fn open(&mut self) -> Option<DeckResolution> {
        let entry = self.queue.current().cloned();
        self.engine.load_entry(entry, None, &mut self.events);
        self.engine
            .load_deck_from(&mut self.provider, &mut self.events)
    }

    /// Retry a failed deck fetch for the current entry.
    pub fn retry_deck(&mut self) -> Option<DeckResolution> {
        self.engine
            .load_deck_from(&mut self.provider, &mut self.events)
    }

    pub fn flip(&mut self, position: usize) -> bool {
        self.engine.flip(position, &mut self.events)
    }

    pub fn reshuffle(&mut self) -> Option<DeckResolution> {
        self.engine.reshuffle(&mut self.provider, &mut self.events)
    }

    /// Hand the finished entry to the queue and load the next one.
    /// `None` while the current entry cannot complete.
    pub fn complete_entry(&mut self) -> Option<AdvanceOutcome> {
        let selection = self.engine.complete()?;
        let reading = self.engine.reading();
        let outcome = self.queue.advance(selection, &mut self.events);
        match &outcome {
            AdvanceOutcome::Next(entry) => {
                self.readings.extend(reading);
                self.engine
                    .load_entry(Some(entry.clone()), None, &mut self.events);
                self.engine
                    .load_deck_from(&mut self.provider, &mut self.events);
            }
            AdvanceOutcome::Complete(selections) => {
                self.readings.extend(reading);
                self.outcome = Some(selections.clone());
                self.engine.load_entry(None, None, &mut self.events);
            }
            AdvanceOutcome::Ignored => {}
        }
        Some(outcome)
    }

    /// Drop everything drawn in this consultation.
    pub fn close(&mut self) {
        self.queue.close(&mut self.events);
        self.engine.load_entry(None, None, &mut self.events);
        self.readings.clear();
        self.outcome = None;
    }

    pub fn queue(&self) -> &OracleQueue {
        &self.queue
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn outcome(&self) -> Option<&BTreeMap<String, Vec<usize>>> {
        self.outcome.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain().collect()
    }
}
