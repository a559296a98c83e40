//! # pref-observer
//!
//! Change observation and normalization for native key-value preference
//! stores.
//!
//! Given a store that may or may not say *which* key changed, the engine
//! produces a filtered, de-duplicated, type-normalized stream of change
//! events, plus thread-safe point lookups, while the store is mutated from
//! outside.
//!
//! ## Key Types
//!
//! - [`PreferenceStore`] - What a platform store must provide
//! - [`MemoryStore`] - In-memory store emulating per-key and whole-store notifications
//! - [`PreferencesObserver`] - Lookups and observation sessions over one store
//! - [`ChangeSink`] / [`ChangeStream`] - Where events are delivered
//! - [`PreferenceValue`] - The closed set of values that leave the engine
//!
//! ## Quick Start
//!
//! ```ignore
//! let store = Arc::new(MemoryStore::per_key());
//! let observer = ObserverBuilder::new(store.clone()).namespace("IABTCF").build()?;
//!
//! let (handle, mut events) = observer.observe_stream()?;
//! store.put("IABTCF_gdprApplies", 1);
//! while let Some(event) = events.next().await {
//!     println!("{}", event?.to_json());
//! }
//! observer.stop(&handle);
//! ```

mod config;
mod constants;
mod core;
mod errors;
mod method;
mod metrics;
mod observer;
mod sink;
mod storage;
mod value;

pub use config::*;
pub use constants::*;
pub use core::*;
pub use errors::*;
pub use method::*;
pub use metrics::gather_metrics;
pub use observer::*;
pub use sink::*;
pub use storage::*;
pub use value::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
