//! ObservationSession
//!
//! Owns the single listener registration, the snapshot and the sink of one
//! consumer. Lifecycle: `Idle → Starting → Active → Stopping → Idle`.
//!
//! Locking:
//! - `lifecycle` serializes `start`/`stop` and holds the live registration
//! - `control` holds state, generation and sink; they only change together
//! - the snapshot lock covers read-compare-update plus enqueueing, so two
//!   detection passes never interleave and queue order is detection order
//! - no lock is held while the sink runs (see [`Outbox`])
//!
//! Every start and stop bumps the generation. Queued events and store
//! callbacks carry the generation they were produced under; anything from an
//! older generation is dropped, and nothing leaves the queue unless the
//! session is `Active`.

use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use parking_lot::RwLock;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;

use super::outbox::Outbox;
use super::outbox::Release;
use crate::metrics;
use crate::ChangeCallback;
use crate::ChangeDetector;
use crate::ChangeEvent;
use crate::ChangeSink;
use crate::DetectionMode;
use crate::Error;
use crate::KeyFilter;
use crate::PreferenceStore;
use crate::Result;
use crate::Snapshot;
use crate::SnapshotStore;
use crate::SubscriptionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

/// One consumer's view of the store.
///
/// Cheap to clone; all clones drive the same session. Dropping the last clone
/// releases a registration that is still live.
pub struct ObservationSession<S: PreferenceStore> {
    inner: Arc<SessionInner<S>>,
}

impl<S: PreferenceStore> Clone for ObservationSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Control {
    state: SessionState,
    generation: u64,
    sink: Option<Arc<dyn ChangeSink>>,
}

/// An event waiting for delivery, stamped with the generation it was
/// detected under.
struct Pending {
    generation: u64,
    event: ChangeEvent,
}

struct SessionInner<S: PreferenceStore> {
    id: u64,
    store: Arc<S>,
    filter: KeyFilter,
    resync_after_subscribe: bool,

    lifecycle: Mutex<Option<SubscriptionHandle>>,
    control: RwLock<Control>,
    snapshot: SnapshotStore,
    outbox: Outbox<Pending>,
}

impl<S: PreferenceStore> ObservationSession<S> {
    pub fn new(
        id: u64,
        store: Arc<S>,
        filter: KeyFilter,
        resync_after_subscribe: bool,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                store,
                filter,
                resync_after_subscribe,
                lifecycle: Mutex::new(None),
                control: RwLock::new(Control {
                    state: SessionState::Idle,
                    generation: 0,
                    sink: None,
                }),
                snapshot: SnapshotStore::new(),
                outbox: Outbox::new(),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn state(&self) -> SessionState {
        self.inner.control.read().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Cloned view of the session's snapshot; `None` unless started.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.inner.snapshot.to_snapshot()
    }

    /// Begin observing and route events to `sink`.
    ///
    /// The sink first receives one `Added` event per observable key (ascending
    /// key order), then live changes. If the initial read or the listener
    /// registration fails, `InitializationFailed` is delivered to the sink
    /// once, the session is back to `Idle` and the same error is returned.
    ///
    /// Calling `start` on a session that is not idle does nothing.
    pub fn start(
        &self,
        sink: Arc<dyn ChangeSink>,
    ) -> Result<()> {
        let inner = &self.inner;
        let mut registration = inner.lifecycle.lock();

        let generation = {
            let mut control = inner.control.write();
            if control.state != SessionState::Idle {
                debug!(session_id = inner.id, state = ?control.state, "Session already started; ignoring start");
                return Ok(());
            }
            control.state = SessionState::Starting;
            control.generation += 1;
            control.sink = Some(sink.clone());
            control.generation
        };

        match inner.begin(generation) {
            Ok(handle) => {
                *registration = Some(handle);
                inner.control.write().state = SessionState::Active;
                drop(registration);

                metrics::record_session("started");
                info!(
                    session_id = inner.id,
                    keys = inner.snapshot.len(),
                    "Observation session started"
                );

                inner.deliver_pending();
                if inner.resync_after_subscribe {
                    inner.on_store_changed(generation, DetectionMode::WholeStore);
                }
                Ok(())
            }
            Err(e) => {
                inner.teardown(None);
                drop(registration);

                error!(session_id = inner.id, error = %e, "Observation session failed to start");
                sink.fail(Error::initialization(&e));
                Err(Error::initialization(&e))
            }
        }
    }

    /// Stop observing. Safe before any start and safe to repeat.
    ///
    /// Undelivered events are dropped.
    pub fn stop(&self) {
        let inner = &self.inner;
        let mut registration = inner.lifecycle.lock();

        if inner.control.read().state == SessionState::Idle {
            trace!(session_id = inner.id, "Session idle; nothing to stop");
            return;
        }

        let dropped = inner.teardown(registration.take());

        metrics::record_session("stopped");
        info!(session_id = inner.id, dropped, "Observation session stopped");
    }
}

impl<S: PreferenceStore> SessionInner<S> {
    /// Populate the snapshot, queue the replay and register the listener.
    fn begin(
        self: &Arc<Self>,
        generation: u64,
    ) -> Result<SubscriptionHandle> {
        let (snapshot, replay) =
            ChangeDetector::new(self.store.as_ref(), &self.filter).initial_snapshot()?;
        self.snapshot.install(snapshot);
        self.outbox.push_all(stamp(generation, replay));

        let weak: Weak<Self> = Arc::downgrade(self);
        let on_change: ChangeCallback = Arc::new(move |key: Option<&str>| {
            if let Some(inner) = weak.upgrade() {
                inner.on_store_changed(generation, DetectionMode::from(key));
            }
        });
        let handle = self.store.subscribe(on_change)?;
        debug!(session_id = self.id, handle = handle.id(), "Listener registered");
        Ok(handle)
    }

    /// Back to `Idle`. Must be called with the lifecycle lock held.
    ///
    /// Returns the number of undelivered events that were dropped.
    fn teardown(
        &self,
        registration: Option<SubscriptionHandle>,
    ) -> usize {
        {
            let mut control = self.control.write();
            control.state = SessionState::Stopping;
            control.generation += 1;
            control.sink = None;
        }
        if let Some(handle) = registration {
            self.store.unsubscribe(handle);
        }
        self.snapshot.discard();
        let dropped = self.outbox.clear();
        self.control.write().state = SessionState::Idle;
        dropped
    }

    fn on_store_changed(
        &self,
        generation: u64,
        mode: DetectionMode<'_>,
    ) {
        if !self.is_current(generation) {
            trace!(session_id = self.id, generation, "Stale notification ignored");
            return;
        }

        let detector = ChangeDetector::new(self.store.as_ref(), &self.filter);
        let enqueued = self.snapshot.update(|snapshot| {
            // A stop/start may have slipped in before the lock was taken
            if !self.is_current(generation) {
                return 0;
            }
            let events = detector.detect(mode, snapshot);
            let count = events.len();
            self.outbox.push_all(stamp(generation, events));
            count
        });
        trace!(session_id = self.id, ?mode, ?enqueued, "Detection pass finished");

        self.deliver_pending();
    }

    fn is_current(
        &self,
        generation: u64,
    ) -> bool {
        self.control.read().generation == generation
    }

    /// Deliver queued events of the current generation while `Active`.
    ///
    /// The sink is read together with the state and generation, under the
    /// queue lock, so an event can only reach the sink of the generation
    /// that produced it. Events queued during `Starting` stay queued until
    /// `start` drains them.
    fn deliver_pending(&self) {
        self.outbox.drain(
            |pending: &Pending| {
                let control = self.control.read();
                if pending.generation != control.generation {
                    return Release::Discard;
                }
                match (&control.state, &control.sink) {
                    (SessionState::Active, Some(sink)) => Release::Deliver(sink.clone()),
                    _ => Release::Hold,
                }
            },
            |pending, sink| sink.deliver(pending.event),
        );
    }
}

fn stamp(
    generation: u64,
    events: Vec<ChangeEvent>,
) -> Vec<Pending> {
    events
        .into_iter()
        .map(|event| Pending { generation, event })
        .collect()
}

impl<S: PreferenceStore> Drop for SessionInner<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.lifecycle.get_mut().take() {
            self.store.unsubscribe(handle);
            debug!(session_id = self.id, "Released live registration on drop");
        }
    }
}

impl<S: PreferenceStore> std::fmt::Debug for ObservationSession<S> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ObservationSession")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("filter", &self.inner.filter)
            .finish()
    }
}
