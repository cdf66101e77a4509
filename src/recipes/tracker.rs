use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::sync::watch;

use crate::edamam::client::SearchError;

/// Advisory snapshot of the most recent search. Never a cache: every call
/// re-fetches; this only lets observers reflect loading state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStatus {
    pub generation: u64,
    pub in_flight: bool,
    pub result_count: usize,
    pub error: Option<String>,
}

/// Hands out a monotonic generation per search and publishes the newest
/// state over a watch channel. Completions that lost the race to a newer
/// search are discarded instead of overwriting shared state.
#[derive(Clone)]
pub struct SearchTracker {
    next: Arc<AtomicU64>,
    tx: Arc<watch::Sender<SearchStatus>>,
}

pub struct SearchTicket {
    generation: u64,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for SearchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SearchStatus::default());
        Self {
            next: Arc::new(AtomicU64::new(0)),
            tx: Arc::new(tx),
        }
    }

    pub fn begin(&self) -> SearchTicket {
        let generation = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_modify(|status| {
            if generation > status.generation {
                *status = SearchStatus {
                    generation,
                    in_flight: true,
                    result_count: 0,
                    error: None,
                };
            }
        });
        SearchTicket { generation }
    }

    /// Publish a successful completion. Returns false when the ticket is
    /// stale (a newer search already owns the published state).
    pub fn complete(&self, ticket: &SearchTicket, result_count: usize) -> bool {
        self.publish(ticket, result_count, None)
    }

    pub fn fail(&self, ticket: &SearchTicket, error: &SearchError) -> bool {
        self.publish(ticket, 0, Some(error.to_string()))
    }

    fn publish(&self, ticket: &SearchTicket, result_count: usize, error: Option<String>) -> bool {
        let mut accepted = false;
        self.tx.send_modify(|status| {
            if ticket.generation >= status.generation {
                *status = SearchStatus {
                    generation: ticket.generation,
                    in_flight: false,
                    result_count,
                    error,
                };
                accepted = true;
            }
        });
        accepted
    }

    pub fn snapshot(&self) -> SearchStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchStatus> {
        self.tx.subscribe()
    }
}
