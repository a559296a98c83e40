use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::metrics;
use crate::serialize;
use crate::Error;
use crate::KeyFilter;
use crate::PreferenceStore;
use crate::PreferenceValue;
use crate::Result;

/// On-demand read of a single key.
///
/// Always hits the store, never a session snapshot. Safe to call from any
/// thread, including from inside a sink.
pub struct PointLookup<S: PreferenceStore> {
    store: Arc<S>,
    filter: KeyFilter,
}

impl<S: PreferenceStore> PointLookup<S> {
    pub fn new(
        store: Arc<S>,
        filter: KeyFilter,
    ) -> Self {
        Self { store, filter }
    }

    pub fn filter(&self) -> &KeyFilter {
        &self.filter
    }

    /// Current serialized value of `key`.
    ///
    /// - empty key: `InvalidArgument`
    /// - key outside the namespace: `AccessDenied` (never `Null`)
    /// - absent key or unrepresentable value: `Null`
    pub fn get(
        &self,
        key: &str,
    ) -> Result<PreferenceValue> {
        let result = self.read(key);
        metrics::record_lookup(match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        });
        result
    }

    fn read(
        &self,
        key: &str,
    ) -> Result<PreferenceValue> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("key must not be empty".to_string()));
        }
        self.filter.check(key)?;

        match self.store.read_one(key) {
            Ok(Some(native)) => Ok(serialize(&native)),
            Ok(None) => {
                debug!(%key, "Lookup of absent key");
                Ok(PreferenceValue::Null)
            }
            Err(e) => {
                warn!(%key, error = %e, "Point lookup failed");
                Err(e)
            }
        }
    }
}

impl<S: PreferenceStore> std::fmt::Debug for PointLookup<S> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("PointLookup").field("filter", &self.filter).finish()
    }
}
