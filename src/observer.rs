//! PreferencesObserver
//!
//! Consumer-facing facade: point lookups plus any number of independent
//! observation sessions over one store. Every session has its own snapshot,
//! sink and listener registration; all of them share the store and the
//! namespace filter.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use tracing::info;

use crate::sink;
use crate::ChangeSink;
use crate::ChangeStream;
use crate::KeyFilter;
use crate::ObservationSession;
use crate::ObserverConfig;
use crate::PointLookup;
use crate::PreferenceStore;
use crate::PreferenceValue;
use crate::Result;

/// Identifies a session started through [`PreferencesObserver::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    id: u64,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

pub struct PreferencesObserver<S: PreferenceStore> {
    store: Arc<S>,
    filter: KeyFilter,
    config: ObserverConfig,
    lookup: PointLookup<S>,
    sessions: DashMap<u64, ObservationSession<S>>,
    next_session_id: AtomicU64,
}

impl<S: PreferenceStore> PreferencesObserver<S> {
    /// Validates `config` and builds the observer.
    pub fn new(
        store: Arc<S>,
        config: ObserverConfig,
    ) -> Result<Self> {
        let config = config.validate()?;
        let filter = KeyFilter::from_config(&config.filter);
        info!(namespace = filter.namespace(), "Preferences observer created");

        Ok(Self {
            lookup: PointLookup::new(store.clone(), filter.clone()),
            store,
            filter,
            config,
            sessions: DashMap::new(),
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn builder(store: Arc<S>) -> ObserverBuilder<S> {
        ObserverBuilder::new(store)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn filter(&self) -> &KeyFilter {
        &self.filter
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// See [`PointLookup::get`].
    pub fn lookup(
        &self,
        key: &str,
    ) -> Result<PreferenceValue> {
        self.lookup.get(key)
    }

    /// Start a new session delivering to `sink`.
    ///
    /// On failure the sink has already received `InitializationFailed` and
    /// nothing stays registered.
    pub fn observe(
        &self,
        sink: Arc<dyn ChangeSink>,
    ) -> Result<SessionHandle> {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let session = ObservationSession::new(
            id,
            self.store.clone(),
            self.filter.clone(),
            self.config.delivery.resync_after_subscribe,
        );

        // Visible to `stop` while the replay is delivered
        self.sessions.insert(id, session.clone());
        if let Err(e) = session.start(sink) {
            self.sessions.remove(&id);
            return Err(e);
        }

        debug!(session_id = id, "Session registered");
        Ok(SessionHandle { id })
    }

    /// Start a session whose events arrive on a [`ChangeStream`].
    ///
    /// The channel capacity comes from `delivery.channel_buffer_size`.
    pub fn observe_stream(&self) -> Result<(SessionHandle, ChangeStream)> {
        let (sink, stream) = sink::channel(self.config.delivery.channel_buffer_size);
        let handle = self.observe(Arc::new(sink))?;
        Ok((handle, stream))
    }

    /// Stop a session. Unknown or already stopped handles are ignored.
    pub fn stop(
        &self,
        handle: &SessionHandle,
    ) {
        // Removed first, stopped outside the map shard lock
        let removed = self.sessions.remove(&handle.id);
        match removed {
            Some((_, session)) => session.stop(),
            None => debug!(session_id = handle.id, "Stop of unknown session ignored"),
        }
    }

    pub fn session(
        &self,
        handle: &SessionHandle,
    ) -> Option<ObservationSession<S>> {
        self.sessions.get(&handle.id).map(|entry| entry.value().clone())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Stop every session.
    pub fn shutdown(&self) {
        let ids: Vec<u64> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.stop(&SessionHandle { id });
        }
    }
}

impl<S: PreferenceStore> Drop for PreferencesObserver<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: PreferenceStore> std::fmt::Debug for PreferencesObserver<S> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("PreferencesObserver")
            .field("filter", &self.filter)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

/// Fluent construction of a [`PreferencesObserver`].
///
/// ```ignore
/// let observer = ObserverBuilder::new(store)
///     .namespace("IABTCF")
///     .channel_buffer_size(128)
///     .build()?;
/// ```
pub struct ObserverBuilder<S: PreferenceStore> {
    store: Arc<S>,
    config: ObserverConfig,
}

impl<S: PreferenceStore> ObserverBuilder<S> {
    /// Starts from the default configuration
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: ObserverConfig::default(),
        }
    }

    /// Starts from defaults merged with `CONFIG_PATH` and `PREFS__*`
    pub fn from_env(store: Arc<S>) -> Result<Self> {
        Ok(Self {
            store,
            config: ObserverConfig::new()?,
        })
    }

    /// Replaces the entire configuration
    pub fn config(
        mut self,
        config: ObserverConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn namespace(
        mut self,
        namespace: impl Into<String>,
    ) -> Self {
        self.config.filter.namespace = namespace.into();
        self
    }

    pub fn allow_empty_namespace(
        mut self,
        allow: bool,
    ) -> Self {
        self.config.filter.allow_empty_namespace = allow;
        self
    }

    pub fn channel_buffer_size(
        mut self,
        size: usize,
    ) -> Self {
        self.config.delivery.channel_buffer_size = size;
        self
    }

    pub fn resync_after_subscribe(
        mut self,
        enabled: bool,
    ) -> Self {
        self.config.delivery.resync_after_subscribe = enabled;
        self
    }

    /// Validates the configuration and constructs the observer.
    pub fn build(self) -> Result<PreferencesObserver<S>> {
        PreferencesObserver::new(self.store, self.config)
    }
}
