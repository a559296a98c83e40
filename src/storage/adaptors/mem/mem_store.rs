use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use crate::ChangeCallback;
use crate::NativeValue;
use crate::PreferenceStore;
use crate::Result;
use crate::StoreError;
use crate::SubscriptionHandle;

/// What a store's change notification tells its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationGranularity {
    /// One callback per changed key; a full clear reports no key
    /// (SharedPreferences-like).
    PerKey,
    /// One blanket callback per mutation, never naming the key
    /// (UserDefaults-like).
    WholeStore,
}

/// In-memory preference store.
///
/// Emulates either native notification model. Every write notifies, even
/// when the stored value did not change, so de-duplication is always the
/// engine's job. Listeners are invoked after the data lock is released and
/// may read the store from inside the callback.
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, NativeValue>>,
    listeners: DashMap<u64, Listener>,
    next_id: AtomicU64,
    granularity: NotificationGranularity,
    // Simulates a detached store: every read fails while false
    available: AtomicBool,
}

struct Listener(ChangeCallback);

impl std::fmt::Debug for Listener {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str("Listener")
    }
}

/// Batched mutations applied by [`MemoryStore::edit`].
#[derive(Debug, Default)]
pub struct StoreEdit {
    ops: Vec<(String, Option<NativeValue>)>,
}

impl StoreEdit {
    pub fn put(
        &mut self,
        key: impl Into<String>,
        value: impl Into<NativeValue>,
    ) -> &mut Self {
        self.ops.push((key.into(), Some(value.into())));
        self
    }

    pub fn remove(
        &mut self,
        key: impl Into<String>,
    ) -> &mut Self {
        self.ops.push((key.into(), None));
        self
    }
}

impl MemoryStore {
    pub fn new(granularity: NotificationGranularity) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
            granularity,
            available: AtomicBool::new(true),
        }
    }

    pub fn per_key() -> Self {
        Self::new(NotificationGranularity::PerKey)
    }

    pub fn whole_store() -> Self {
        Self::new(NotificationGranularity::WholeStore)
    }

    /// Seed entries without notifying anyone.
    pub fn with_entries<I, K, V>(
        self,
        entries: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<NativeValue>,
    {
        {
            let mut data = self.data.write();
            for (k, v) in entries {
                data.insert(k.into(), v.into());
            }
        }
        self
    }

    pub fn granularity(&self) -> NotificationGranularity {
        self.granularity
    }

    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<NativeValue>,
    ) {
        let key = key.into();
        self.data.write().insert(key.clone(), value.into());
        self.notify(&[key]);
    }

    pub fn remove(
        &self,
        key: &str,
    ) {
        let removed = self.data.write().remove(key).is_some();
        if removed {
            self.notify(&[key.to_string()]);
        }
    }

    /// Apply several mutations under one write lock.
    ///
    /// Per-key stores then notify once per touched key in edit order;
    /// whole-store stores notify once.
    pub fn edit<F>(
        &self,
        f: F,
    ) where
        F: FnOnce(&mut StoreEdit),
    {
        let mut edit = StoreEdit::default();
        f(&mut edit);
        if edit.ops.is_empty() {
            return;
        }

        let mut touched = Vec::with_capacity(edit.ops.len());
        {
            let mut data = self.data.write();
            for (key, op) in edit.ops {
                match op {
                    Some(value) => {
                        data.insert(key.clone(), value);
                    }
                    None => {
                        data.remove(&key);
                    }
                }
                if !touched.contains(&key) {
                    touched.push(key);
                }
            }
        }
        self.notify(&touched);
    }

    /// Remove every entry. Listeners are told that "something" changed.
    pub fn clear(&self) {
        let had_entries = {
            let mut data = self.data.write();
            let had = !data.is_empty();
            data.clear();
            had
        };
        if had_entries {
            self.notify_all(None);
        }
    }

    pub fn set_available(
        &self,
        available: bool,
    ) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(
        &self,
        keys: &[String],
    ) {
        match self.granularity {
            NotificationGranularity::PerKey => {
                for key in keys {
                    self.notify_all(Some(key));
                }
            }
            NotificationGranularity::WholeStore => self.notify_all(None),
        }
    }

    fn notify_all(
        &self,
        key: Option<&str>,
    ) {
        // Snapshot the callbacks so no shard lock is held while they run:
        // a callback is allowed to unsubscribe itself.
        let callbacks: Vec<ChangeCallback> =
            self.listeners.iter().map(|entry| entry.value().0.clone()).collect();

        trace!(key = ?key, listeners = callbacks.len(), "Notifying store listeners");
        for callback in callbacks {
            callback(key);
        }
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store detached".to_string()).into())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::per_key()
    }
}

impl PreferenceStore for MemoryStore {
    fn read_all(&self) -> Result<HashMap<String, NativeValue>> {
        self.ensure_available()?;
        Ok(self.data.read().clone())
    }

    fn read_one(
        &self,
        key: &str,
    ) -> Result<Option<NativeValue>> {
        self.ensure_available()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn subscribe(
        &self,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, Listener(on_change));
        debug!(subscription_id = id, "Store listener registered");
        Ok(SubscriptionHandle::new(id))
    }

    fn unsubscribe(
        &self,
        handle: SubscriptionHandle,
    ) {
        if self.listeners.remove(&handle.id()).is_some() {
            debug!(subscription_id = handle.id(), "Store listener unregistered");
        }
    }
}
