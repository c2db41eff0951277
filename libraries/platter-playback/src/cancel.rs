//! Generation-based cancellation
//!
//! Every request kind that can be superseded (sequencer timers, deferred
//! seeks, source resolution batches) draws a [`Ticket`] from its own
//! [`Generation`]. Issuing a new ticket or calling [`Generation::cancel`]
//! invalidates every ticket handed out before, so a late callback carrying
//! an old ticket is recognised as stale and dropped.

/// Opaque token identifying one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw sequence number, for logging
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Issues tickets and remembers which one is current
#[derive(Debug, Default)]
pub struct Generation {
    counter: u64,
    current: Option<Ticket>,
}

impl Generation {
    /// Create a generation with no outstanding ticket
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate any outstanding ticket and issue a fresh one
    pub fn issue(&mut self) -> Ticket {
        self.counter = self.counter.wrapping_add(1);
        let ticket = Ticket(self.counter);
        self.current = Some(ticket);
        ticket
    }

    /// Invalidate the outstanding ticket, returning it if there was one
    pub fn cancel(&mut self) -> Option<Ticket> {
        self.current.take()
    }

    /// Consume the ticket if it is still current
    ///
    /// Returns `true` exactly once per issued ticket; the ticket is no longer
    /// outstanding afterwards.
    pub fn redeem(&mut self, ticket: Ticket) -> bool {
        if self.current == Some(ticket) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Check the ticket without consuming it
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current == Some(ticket)
    }

    /// Whether a ticket is outstanding
    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }
}
