use std::collections::HashMap;

use crate::NativeValue;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Build a `read_all` result from `(key, value)` pairs.
pub fn native_map<I, K, V>(entries: I) -> HashMap<String, NativeValue>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<NativeValue>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
