#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use pref_observer::ChangeEvent;
use pref_observer::ChangeSink;
use pref_observer::Error;
use pref_observer::MemoryStore;
use pref_observer::NativeValue;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for integration test.");
}

/// Sink keeping every event and error it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ChangeEvent>>,
    errors: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    pub fn take_events(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn error_codes(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl ChangeSink for CollectingSink {
    fn deliver(
        &self,
        event: ChangeEvent,
    ) {
        self.events.lock().push(event);
    }

    fn fail(
        &self,
        error: Error,
    ) {
        self.errors.lock().push(error.code().to_string());
    }
}

/// Store holding a typical CMP write: TCF keys plus an unrelated key.
pub fn consent_store(store: MemoryStore) -> Arc<MemoryStore> {
    Arc::new(store.with_entries([
        ("IABTCF_CmpSdkID", NativeValue::Int(300)),
        ("IABTCF_gdprApplies", NativeValue::Int(1)),
        ("IABTCF_TCString", NativeValue::from("CPxx")),
        ("OTHER_KEY", NativeValue::from("x")),
    ]))
}
