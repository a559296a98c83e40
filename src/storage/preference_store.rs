//! PreferenceStore
//!
//! The capability set the engine consumes from a native preference store:
//! - Full and point reads of native values
//! - Registering a change callback (keyed or blanket notifications)
//! - Idempotent release of that registration
//!
//! Platform adapters implement this trait; diffing, filtering and
//! serialization live in the engine and are written once.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::NativeValue;
use crate::Result;

/// Invoked by the store on any mutation.
///
/// Receives the changed key when the store can identify it, `None` to signal
/// "something changed, re-diff everything". May be called from any thread.
pub type ChangeCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Token identifying one listener registration inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[cfg_attr(test, automock)]
pub trait PreferenceStore: Send + Sync + 'static {
    /// Synchronous full snapshot of the store
    fn read_all(&self) -> Result<HashMap<String, NativeValue>>;

    /// Synchronous point read; `Ok(None)` when the key is absent
    fn read_one(
        &self,
        key: &str,
    ) -> Result<Option<NativeValue>>;

    /// Register a change callback
    fn subscribe(
        &self,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle>;

    /// Release a registration. Unknown or already released handles are ignored.
    fn unsubscribe(
        &self,
        handle: SubscriptionHandle,
    );
}
