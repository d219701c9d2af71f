use crate::{Event, EventBus, Method, MethodError, OracleType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("unknown oracle type `{0}`")]
    UnknownOracle(String),
    #[error(transparent)]
    Method(#[from] MethodError),
    #[error("queue item `{0}` must look like oracle:method")]
    BadSpec(String),
    #[error("queue is empty")]
    Empty,
}

/// One oracle draw inside a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntry {
    pub oracle_type: OracleType,
    pub method: Method,
    pub spread_code: String,
}

impl QueueEntry {
    pub fn new(method: Method) -> Self {
        Self {
            oracle_type: method.oracle(),
            method,
            spread_code: method.key().to_string(),
        }
    }

    pub fn parse(oracle: &str, method: &str) -> Result<Self, QueueError> {
        let oracle_type =
            OracleType::parse(oracle).ok_or_else(|| QueueError::UnknownOracle(oracle.to_string()))?;
        let method = Method::parse(oracle_type, method)?;
        Ok(Self::new(method))
    }

    /// Composite key used in the completed selection map.
    pub fn key(&self) -> String {
        format!("{}_{}", self.oracle_type.as_str(), self.method.key())
    }

    pub fn cards_needed(&self) -> usize {
        self.method.cards_needed()
    }
}

/// Entry as routing data delivers it; fields may still be unresolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQueueEntry {
    #[serde(default, alias = "oracleType")]
    pub oracle_type: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, alias = "spreadCode")]
    pub spread_code: Option<String>,
}

impl RawQueueEntry {
    /// `None` while either field is missing or unrecognized.
    pub fn resolve(&self) -> Option<QueueEntry> {
        let oracle = self.oracle_type.as_deref()?;
        let method = self.method.as_deref()?;
        match QueueEntry::parse(oracle, method) {
            Ok(mut entry) => {
                if let Some(code) = self.spread_code.as_ref().filter(|c| !c.trim().is_empty()) {
                    entry.spread_code = code.clone();
                }
                Some(entry)
            }
            Err(err) => {
                tracing::debug!("unresolved queue entry: {err}");
                None
            }
        }
    }
}

/// Parse `tarot:tres_ppp,lenormand:grand_tableau`.
pub fn parse_queue_spec(spec: &str) -> Result<Vec<QueueEntry>, QueueError> {
    let mut entries = Vec::new();
    for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let Some((oracle, method)) = item.split_once(':') else {
            return Err(QueueError::BadSpec(item.to_string()));
        };
        entries.push(QueueEntry::parse(oracle, method)?);
    }
    if entries.is_empty() {
        return Err(QueueError::Empty);
    }
    Ok(entries)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Drawing,
    Complete,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Cursor moved; the caller loads this entry next.
    Next(QueueEntry),
    Complete(BTreeMap<String, Vec<usize>>),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct OracleQueue {
    entries: Vec<QueueEntry>,
    current: usize,
    selections: BTreeMap<String, Vec<usize>>,
    status: QueueStatus,
}

impl OracleQueue {
    pub fn new(entries: Vec<QueueEntry>) -> Self {
        let status = if entries.is_empty() {
            QueueStatus::Complete
        } else {
            QueueStatus::Drawing
        };
        Self {
            entries,
            current: 0,
            selections: BTreeMap::new(),
            status,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        if self.status != QueueStatus::Drawing {
            return None;
        }
        self.entries.get(self.current)
    }

    pub fn status(&self) -> QueueStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == QueueStatus::Complete
    }

    pub fn is_closed(&self) -> bool {
        self.status == QueueStatus::Closed
    }

    pub fn selections(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.selections
    }

    /// Record the current entry's selection and move on, strictly in order.
    pub fn advance(&mut self, selection: Vec<usize>, events: &mut EventBus) -> AdvanceOutcome {
        let Some(entry) = self.current() else {
            return AdvanceOutcome::Ignored;
        };
        let key = entry.key();
        tracing::debug!(index = self.current, %key, cards = selection.len(), "entry recorded");
        events.push(Event::EntryCompleted {
            key: key.clone(),
            positions: selection.clone(),
        });
        self.selections.insert(key, selection);

        if self.current + 1 < self.entries.len() {
            self.current += 1;
            events.push(Event::QueueAdvanced {
                index: self.current,
            });
            return AdvanceOutcome::Next(self.entries[self.current].clone());
        }

        self.current = self.entries.len();
        self.status = QueueStatus::Complete;
        events.push(Event::QueueCompleted {
            entries: self.entries.len(),
        });
        AdvanceOutcome::Complete(self.selections.clone())
    }

    /// Abandon the consultation; nothing drawn so far survives.
    pub fn close(&mut self, events: &mut EventBus) {
        let discarded = self.selections.len();
        self.selections.clear();
        self.status = QueueStatus::Closed;
        tracing::debug!(discarded, "consultation closed");
        events.push(Event::ConsultationClosed { discarded });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_queue_specs() {
        let entries = parse_queue_spec("tarot:tres_ppp, lenormand:grand_tableau").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key(), "tarot_tres_ppp");
        assert_eq!(entries[1].key(), "lenormand_grand_tableau");
        assert_eq!(entries[1].spread_code, "grand_tableau");
    }

    #[test]
    fn rejects_bad_queue_specs() {
        assert_eq!(
            parse_queue_spec("tarot"),
            Err(QueueError::BadSpec("tarot".to_string()))
        );
        assert!(matches!(
            parse_queue_spec("runes:three"),
            Err(QueueError::UnknownOracle(_))
        ));
        assert!(matches!(
            parse_queue_spec("tarot:grand_tableau"),
            Err(QueueError::Method(_))
        ));
        assert_eq!(parse_queue_spec(" , "), Err(QueueError::Empty));
    }

    #[test]
    fn raw_entries_with_missing_fields_do_not_resolve() {
        let raw = RawQueueEntry {
            oracle_type: Some("tarot".to_string()),
            ..RawQueueEntry::default()
        };
        assert_eq!(raw.resolve(), None);
        let raw = RawQueueEntry {
            oracle_type: Some("tarot".to_string()),
            method: Some("cruz_celta".to_string()),
            spread_code: Some("cruz_celta_v2".to_string()),
        };
        assert_eq!(raw.resolve().map(|e| e.spread_code), Some("cruz_celta_v2".to_string()));
    }

    #[test]
    fn close_discards_recorded_selections() {
        let mut events = EventBus::default();
        let mut queue = OracleQueue::new(vec![
            QueueEntry::new(Method::CartaDoDia),
            QueueEntry::new(Method::TresCartas),
        ]);
        queue.advance(vec![4], &mut events);
        assert_eq!(queue.selections().len(), 1);
        queue.close(&mut events);
        assert!(queue.selections().is_empty());
        assert!(queue.is_closed());
        assert_eq!(queue.advance(vec![1, 2, 3], &mut events), AdvanceOutcome::Ignored);
    }
}
