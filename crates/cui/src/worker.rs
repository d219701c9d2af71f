use anyhow::{Context, Result};
use oraculo_core::{DeckProvider, DeckRequest, DeckResponse, DeckTicket, ProviderError};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
pub struct WorkerReply {
    pub ticket: DeckTicket,
    pub result: Result<DeckResponse, ProviderError>,
}

/// Owns the deck provider on a background thread so the UI never blocks on it.
/// Replies come back in request order; the engine decides which are stale.
pub struct DeckWorker {
    requests: Sender<DeckRequest>,
    replies: Receiver<WorkerReply>,
}

impl DeckWorker {
    pub fn spawn(mut provider: Box<dyn DeckProvider + Send>) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<DeckRequest>();
        let (reply_tx, reply_rx) = mpsc::channel();
        thread::Builder::new()
            .name("deck-worker".to_string())
            .spawn(move || {
                for request in request_rx {
                    tracing::debug!(
                        generation = request.ticket.generation,
                        purpose = ?request.ticket.purpose,
                        oracle = %request.oracle_type,
                        "fetching deck"
                    );
                    let result = provider.fetch_deck(&request);
                    let reply = WorkerReply {
                        ticket: request.ticket,
                        result,
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                tracing::debug!("deck worker stopped");
            })
            .context("spawn deck worker")?;
        Ok(Self {
            requests: request_tx,
            replies: reply_rx,
        })
    }

    pub fn submit(&self, request: DeckRequest) -> Result<(), ProviderError> {
        self.requests
            .send(request)
            .map_err(|_| ProviderError::Unavailable("deck worker stopped".to_string()))
    }

    /// Replies that arrived since the last poll.
    pub fn poll(&self) -> Vec<WorkerReply> {
        self.replies.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerReply> {
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => Some(reply),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraculo_core::{DeckPurpose, OracleType, ShuffledDeckProvider};

    #[test]
    fn replies_carry_the_request_ticket() {
        let worker = DeckWorker::spawn(Box::new(ShuffledDeckProvider::new(3))).unwrap();
        let ticket = DeckTicket {
            generation: 4,
            purpose: DeckPurpose::Reshuffle,
        };
        worker
            .submit(DeckRequest {
                ticket,
                oracle_type: OracleType::Lenormand,
                spread_code: "linha_de_tres".to_string(),
            })
            .unwrap();
        let reply = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reply.ticket, ticket);
        assert_eq!(reply.result.unwrap().deck.len(), 36);
    }
}
