use std::sync::Arc;

use parking_lot::Mutex;

use crate::ChangeEvent;
use crate::ChangeSink;
use crate::Error;

/// Sink that keeps everything it is handed.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChangeEvent>>,
    errors: Mutex<Vec<Error>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.key.clone()).collect()
    }

    pub fn take_events(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn error_codes(&self) -> Vec<&'static str> {
        self.errors.lock().iter().map(Error::code).collect()
    }
}

impl ChangeSink for RecordingSink {
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
        self.errors.lock().push(error);
    }
}
