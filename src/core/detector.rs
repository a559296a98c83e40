//! ChangeDetector
//!
//! Computes the minimal Added/Updated/Removed events between a session's
//! [`Snapshot`] and the live store, and applies them to the snapshot.
//!
//! Two entry points, one engine:
//! - keyed: the store named the changed key, only that key is re-read
//! - whole-store: the store only said "something changed", every observable
//!   key (current ∪ snapshot) is compared
//!
//! Values are compared after serialization, by value equality. Native stores
//! routinely hand out fresh instances for unchanged values; comparing
//! identities would turn every notification into a burst of duplicates.

use std::collections::BTreeSet;
use std::collections::HashMap;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::metrics;
use crate::serialize_entry;
use crate::ChangeEvent;
use crate::Error;
use crate::KeyFilter;
use crate::NativeValue;
use crate::PreferenceStore;
use crate::PreferenceValue;
use crate::Result;
use crate::Snapshot;

/// What a store notification told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode<'a> {
    Keyed(&'a str),
    WholeStore,
}

impl<'a> From<Option<&'a str>> for DetectionMode<'a> {
    fn from(key: Option<&'a str>) -> Self {
        match key {
            Some(key) => DetectionMode::Keyed(key),
            None => DetectionMode::WholeStore,
        }
    }
}

pub struct ChangeDetector<'a, S: PreferenceStore + ?Sized> {
    store: &'a S,
    filter: &'a KeyFilter,
}

impl<'a, S: PreferenceStore + ?Sized> ChangeDetector<'a, S> {
    pub fn new(
        store: &'a S,
        filter: &'a KeyFilter,
    ) -> Self {
        Self { store, filter }
    }

    /// Full read used when a session starts.
    ///
    /// Returns the populated snapshot and one `Added` event per observable
    /// key in ascending key order. A failing store read is returned to the
    /// caller; unrepresentable values are skipped.
    pub fn initial_snapshot(&self) -> Result<(Snapshot, Vec<ChangeEvent>)> {
        let current = self.read_observable()?;

        let mut snapshot = Snapshot::new();
        for (key, value) in current {
            snapshot.insert(key, value);
        }

        let events: Vec<ChangeEvent> = snapshot
            .iter()
            .map(|(key, value)| ChangeEvent::added(key.clone(), value.clone()))
            .collect();
        for event in &events {
            metrics::record_event(event);
        }

        debug!(keys = snapshot.len(), "Initial snapshot populated");
        Ok((snapshot, events))
    }

    /// Run one detection pass against `snapshot`, updating it in place.
    ///
    /// Never fails: per-key problems are logged and that key is skipped.
    pub fn detect(
        &self,
        mode: DetectionMode<'_>,
        snapshot: &mut Snapshot,
    ) -> Vec<ChangeEvent> {
        let events = match mode {
            DetectionMode::Keyed(key) => self.detect_key(key, snapshot).into_iter().collect(),
            DetectionMode::WholeStore => self.detect_all(snapshot),
        };

        for event in &events {
            metrics::record_event(event);
        }
        events
    }

    fn detect_key(
        &self,
        key: &str,
        snapshot: &mut Snapshot,
    ) -> Option<ChangeEvent> {
        if !self.filter.is_observable(key) {
            trace!(%key, "Ignoring change outside namespace");
            return None;
        }

        let current = match self.store.read_one(key) {
            Ok(Some(native)) => match serialize_entry(key, &native) {
                Ok(value) => Some(value),
                Err(e) => {
                    skip(key, &e, &native);
                    return None;
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, error = %e, "Native store read failed; skipping key");
                metrics::record_skip("native_error");
                return None;
            }
        };

        apply_change(snapshot, key, current)
    }

    fn detect_all(
        &self,
        snapshot: &mut Snapshot,
    ) -> Vec<ChangeEvent> {
        let raw = match self.store.read_all() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Native store full read failed; skipping detection pass");
                metrics::record_skip("native_error");
                return Vec::new();
            }
        };

        let mut current: HashMap<String, Option<PreferenceValue>> = HashMap::new();
        for (key, native) in raw {
            if !self.filter.is_observable(&key) {
                continue;
            }
            match serialize_entry(&key, &native) {
                Ok(value) => {
                    current.insert(key, Some(value));
                }
                Err(e) => {
                    skip(&key, &e, &native);
                    // Present but unusable: leave the snapshot entry alone
                    current.insert(key, None);
                }
            }
        }

        let keys: BTreeSet<String> =
            snapshot.keys().cloned().chain(current.keys().cloned()).collect();

        let mut events = Vec::new();
        for key in keys {
            let value = match current.remove(&key) {
                Some(Some(value)) => Some(value),
                Some(None) => continue,
                None => None,
            };
            if let Some(event) = apply_change(snapshot, &key, value) {
                events.push(event);
            }
        }

        trace!(events = events.len(), "Whole-store detection pass finished");
        events
    }

    fn read_observable(&self) -> Result<Vec<(String, PreferenceValue)>> {
        let raw = self.store.read_all()?;

        let mut entries = Vec::with_capacity(raw.len());
        for (key, native) in raw {
            if !self.filter.is_observable(&key) {
                continue;
            }
            match serialize_entry(&key, &native) {
                Ok(value) => entries.push((key, value)),
                Err(e) => skip(&key, &e, &native),
            }
        }
        Ok(entries)
    }
}

/// Compare `current` (None = absent) against the snapshot entry for `key`,
/// update the snapshot and return the resulting event, if any.
pub(crate) fn apply_change(
    snapshot: &mut Snapshot,
    key: &str,
    current: Option<PreferenceValue>,
) -> Option<ChangeEvent> {
    match current {
        None => snapshot.remove(key).map(|_| ChangeEvent::removed(key)),
        Some(value) => {
            if snapshot.get(key) == Some(&value) {
                return None;
            }
            match snapshot.insert(key, value.clone()) {
                None => Some(ChangeEvent::added(key, value)),
                Some(_) => Some(ChangeEvent::updated(key, value)),
            }
        }
    }
}

fn skip(
    key: &str,
    error: &Error,
    native: &NativeValue,
) {
    warn!(%key, native_type = native.type_name(), error = %error, "Skipping unrepresentable value");
    metrics::record_skip("unrepresentable");
}
