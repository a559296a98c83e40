//! Last-known state of one observation session.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::PreferenceValue;

/// Key → last observed serialized value, restricted to observable keys.
///
/// Iteration is in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<String, PreferenceValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&PreferenceValue> {
        self.entries.get(key)
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: PreferenceValue,
    ) -> Option<PreferenceValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<PreferenceValue> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PreferenceValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, PreferenceValue)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (String, PreferenceValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Mutual-exclusion slot holding a session's [`Snapshot`].
///
/// Absent while the session is idle. All reads and read-modify-write
/// sequences go through the single lock.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slot: Mutex<Option<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(
        &self,
        snapshot: Snapshot,
    ) {
        *self.slot.lock() = Some(snapshot);
    }

    pub fn discard(&self) -> Option<Snapshot> {
        self.slot.lock().take()
    }

    pub(crate) fn len(&self) -> usize {
        self.slot.lock().as_ref().map(Snapshot::len).unwrap_or(0)
    }

    /// Cloned view of the current snapshot
    pub fn to_snapshot(&self) -> Option<Snapshot> {
        self.slot.lock().clone()
    }

    /// Run `f` with exclusive access to the snapshot.
    ///
    /// Returns `None` without calling `f` when no snapshot is installed.
    pub fn update<R, F>(
        &self,
        f: F,
    ) -> Option<R>
    where
        F: FnOnce(&mut Snapshot) -> R,
    {
        let mut slot = self.slot.lock();
        slot.as_mut().map(f)
    }
}
