// -
// Filtering

/// Namespace used when none is configured (IAB TCF consent keys)
pub const DEFAULT_NAMESPACE: &str = "IABTCF";

// -
// Configuration

/// Environment variable prefix, e.g. `PREFS__FILTER__NAMESPACE`
pub const CONFIG_ENV_PREFIX: &str = "PREFS";

// -
// Method dispatch

pub const GET_VALUE_METHOD: &str = "getValue";
pub const KEY_ARGUMENT: &str = "key";

// -
// Metrics

pub(crate) const METRICS_NAMESPACE: &str = "prefs";
