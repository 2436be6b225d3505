//! Generation-tagged queries
//!
//! Every keystroke starts a new generation. Results computed for an older
//! generation are discarded on arrival, so a slow earlier query can never
//! overwrite the results of a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::cache::IndexSnapshot;
use super::types::ResultGroups;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub generation: u64,
    pub query: String,
}

/// Result groups tagged with the ticket they were computed for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedResults {
    pub generation: u64,
    pub query: String,
    pub groups: ResultGroups,
}

#[derive(Debug, Default)]
pub struct QuerySession {
    latest: AtomicU64,
}

impl QuerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `query`, superseding all earlier tickets.
    pub fn begin(&self, query: impl Into<String>) -> QueryTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        QueryTicket {
            generation,
            query: query.into(),
        }
    }

    pub fn run(&self, snapshot: &IndexSnapshot, ticket: QueryTicket) -> TaggedResults {
        TaggedResults {
            groups: snapshot.query(&ticket.query),
            generation: ticket.generation,
            query: ticket.query,
        }
    }

    /// Generation of the most recent ticket, 0 before the first one.
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest()
    }

    /// The groups, if nothing newer has been issued since `tagged` began.
    pub fn accept(&self, tagged: TaggedResults) -> Option<ResultGroups> {
        if self.is_current(tagged.generation) {
            Some(tagged.groups)
        } else {
            log::debug!(
                "Dropping results for superseded query {:?} (generation {})",
                tagged.query,
                tagged.generation
            );
            None
        }
    }
}
