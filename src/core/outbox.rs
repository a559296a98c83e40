//! Ordered hand-off between detection and delivery.
//!
//! Detection appends to the queue while it still holds the snapshot lock, so
//! queue order is detection order. Delivery happens after every lock is
//! released: whichever thread wins the `draining` flag pops and delivers
//! until the queue is empty, the others just leave their items behind. A
//! sink may therefore call back into the engine (lookup, stop, even a store
//! write) without deadlocking and without reordering events.
//!
//! What may leave the queue is decided by a gate evaluated under the queue
//! lock, one head item at a time.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use tracing::trace;

/// Gate verdict for the head of the queue.
#[derive(Debug)]
pub(crate) enum Release<D> {
    /// Pop the item and hand it to `deliver` together with `D`
    Deliver(D),
    /// Pop the item and drop it
    Discard,
    /// Leave the item (and everything behind it) queued
    Hold,
}

#[derive(Debug)]
pub(crate) struct Outbox<T> {
    queue: Mutex<VecDeque<T>>,
    draining: AtomicBool,
}

impl<T> Outbox<T> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
        }
    }

    pub(crate) fn push_all(
        &self,
        items: Vec<T>,
    ) {
        if items.is_empty() {
            return;
        }
        self.queue.lock().extend(items);
    }

    /// Drop everything not yet delivered. Returns how many items were dropped.
    pub(crate) fn clear(&self) -> usize {
        let mut queue = self.queue.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Deliver queued items in order.
    ///
    /// `gate` runs with the queue lock held and must not block; `deliver`
    /// runs with no lock held. Returns immediately if another thread is
    /// already draining; that thread picks up whatever this caller enqueued.
    /// Stops at the first item the gate holds back.
    pub(crate) fn drain<D, G, F>(
        &self,
        gate: G,
        deliver: F,
    ) where
        G: Fn(&T) -> Release<D>,
        F: Fn(T, D),
    {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            let mut delivered = 0usize;
            while let Some((item, context)) = self.next_releasable(&gate) {
                deliver(item, context);
                delivered += 1;
            }

            self.draining.store(false, Ordering::Release);
            trace!(delivered, "Outbox drained");

            // Items pushed between the last pop and the flag reset would be
            // stranded otherwise
            let pending = {
                let queue = self.queue.lock();
                queue
                    .front()
                    .map(|item| !matches!(gate(item), Release::Hold))
                    .unwrap_or(false)
            };
            if !pending {
                return;
            }
        }
    }

    fn next_releasable<D, G>(
        &self,
        gate: &G,
    ) -> Option<(T, D)>
    where
        G: Fn(&T) -> Release<D>,
    {
        let mut queue = self.queue.lock();
        loop {
            let verdict = gate(queue.front()?);
            match verdict {
                Release::Deliver(context) => return queue.pop_front().map(|item| (item, context)),
                Release::Discard => {
                    queue.pop_front();
                }
                Release::Hold => return None,
            }
        }
    }
}
