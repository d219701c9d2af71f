use crate::{Method, OracleType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    EntryLoaded {
        oracle: OracleType,
        method: Method,
        deck_ready: bool,
    },
    DeckApplied {
        oracle: OracleType,
        cards: usize,
        reshuffle: bool,
    },
    DeckFailed {
        oracle: OracleType,
        reason: String,
        reshuffle: bool,
    },
    StaleDeckDiscarded { generation: u64 },
    CardFlipped { oracle: OracleType, position: usize },
    TableauRevealed { cards: usize },
    EntryCompleted { key: String, positions: Vec<usize> },
    QueueAdvanced { index: usize },
    QueueCompleted { entries: usize },
    ConsultationClosed { discarded: usize },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
