//! Ownership tokens for timer chains
//!
//! A `Generation` is a counter shared by everything that may restart a
//! background chain. Each (re)start advances it and hands the new chain a
//! `Ticket`; a chain whose ticket no longer matches has been superseded and
//! must not touch shared state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared restart counter
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

impl Generation {
    /// Create a counter at generation zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate all outstanding tickets and issue a ticket for the new chain
    #[must_use]
    pub fn advance(&self) -> Ticket {
        let captured = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            current: Arc::clone(&self.current),
            captured,
        }
    }

    /// Invalidate all outstanding tickets without starting a new chain
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    /// Ticket for the chain that currently owns the state
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        Ticket {
            current: Arc::clone(&self.current),
            captured: self.current.load(Ordering::Acquire),
        }
    }
}

/// Proof of ownership held by one background chain
#[derive(Debug, Clone)]
pub struct Ticket {
    current: Arc<AtomicU64>,
    captured: u64,
}

impl Ticket {
    /// True while no restart or stop has happened since this ticket was issued
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.captured
    }
}
