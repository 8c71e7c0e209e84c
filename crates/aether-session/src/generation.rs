//! Monotonic generation counters for discarding stale async results.
//!
//! Each logical flow (endpoint resolution, autocomplete, search) owns one
//! counter. Starting a request takes a [`Ticket`]; its result is applied only
//! if the ticket is still the latest one issued, regardless of the order in
//! which responses arrive.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation number handed out when a request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counter owned by a single flow and mutated through `&mut self`.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn advance(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }

    pub fn current(&self) -> Ticket {
        Ticket(self.current)
    }
}

/// Counter shared with spawned tasks, which check currency before emitting.
#[derive(Debug, Clone, Default)]
pub struct SharedGeneration {
    current: Arc<AtomicU64>,
}

impl SharedGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    pub fn current(&self) -> Ticket {
        Ticket(self.current.load(Ordering::SeqCst))
    }
}
