//! Request-generation bookkeeping for view state.
//!
//! Each load takes a [`Ticket`]; only the holder of the newest ticket may
//! write its result back. A response for an older parameter that resolves
//! after a newer one is discarded instead of overwriting fresher state.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

pub trait Loading {
    fn set_loading(&mut self, loading: bool);
}

struct Slot<S> {
    generation: u64,
    state: S,
}

/// View state guarded by a generation counter. The lock is never held
/// across an await point.
pub struct ViewCell<S> {
    slot: Mutex<Slot<S>>,
}

impl<S> ViewCell<S> {
    pub fn new(state: S) -> Self {
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                state,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<S>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new generation, invalidating every outstanding ticket.
    pub fn begin(&self, prepare: impl FnOnce(&mut S)) -> Ticket {
        let mut slot = self.lock();
        slot.generation += 1;
        prepare(&mut slot.state);
        Ticket(slot.generation)
    }

    /// Ticket for the current generation, for follow-up requests that must not
    /// cancel the load that is already running.
    pub fn ticket(&self) -> Ticket {
        Ticket(self.lock().generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.lock().generation == ticket.0
    }

    /// Applies `apply` only when `ticket` is still current. Returns whether it ran.
    pub fn commit(&self, ticket: Ticket, apply: impl FnOnce(&mut S)) -> bool {
        let mut slot = self.lock();
        if slot.generation != ticket.0 {
            return false;
        }
        apply(&mut slot.state);
        true
    }

    pub fn update<R>(&self, apply: impl FnOnce(&mut S) -> R) -> R {
        apply(&mut self.lock().state)
    }

    pub fn read<R>(&self, view: impl FnOnce(&S) -> R) -> R {
        view(&self.lock().state)
    }
}

impl<S: Clone> ViewCell<S> {
    pub fn snapshot(&self) -> S {
        self.lock().state.clone()
    }
}

impl<S: Loading> ViewCell<S> {
    /// Begins a load: sets the loading flag and returns a guard that clears
    /// it again when dropped, whether the fetch succeeded, failed or the
    /// future was cancelled. A superseded load leaves the flag alone.
    pub fn begin_load(&self, prepare: impl FnOnce(&mut S)) -> (Ticket, LoadingGuard<'_, S>) {
        let ticket = self.begin(|state| {
            prepare(state);
            state.set_loading(true);
        });
        (ticket, LoadingGuard { cell: self, ticket })
    }
}

pub struct LoadingGuard<'a, S: Loading> {
    cell: &'a ViewCell<S>,
    ticket: Ticket,
}

impl<S: Loading> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        self.cell
            .commit(self.ticket, |state| state.set_loading(false));
    }
}

#[cfg(test)]
#[path = "tests/generation_tests.rs"]
mod tests;
