//! Prometheus counters for the observation engine.
//!
//! Counters are created unregistered; [`register_custom_metrics`] attaches
//! them to a registry and [`gather_metrics`] renders the crate-wide
//! [`REGISTRY`] in the text exposition format. No exporter is bundled.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;

use crate::ChangeEvent;
use crate::METRICS_NAMESPACE;


lazy_static! {
    pub static ref CHANGE_EVENTS_EMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("change_events_emitted", "Change events produced by detection"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref KEYS_SKIPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("keys_skipped", "Keys skipped during detection"),
        &["reason"]
    )
    .expect("metric can not be created");

    pub static ref SESSION_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("session_transitions", "Observation sessions started and stopped"),
        &["transition"]
    )
    .expect("metric can not be created");

    pub static ref POINT_LOOKUPS: IntCounterVec = IntCounterVec::new(
        Opts::new("point_lookups", "Point lookups by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry =
        Registry::new_custom(Some(METRICS_NAMESPACE.to_string()), None)
            .expect("registry can be created");
}

static REGISTER: Once = Once::new();

pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(CHANGE_EVENTS_EMITTED.clone()))?;
    registry.register(Box::new(KEYS_SKIPPED.clone()))?;
    registry.register(Box::new(SESSION_TRANSITIONS.clone()))?;
    registry.register(Box::new(POINT_LOOKUPS.clone()))?;
    Ok(())
}

/// Text exposition of every engine counter.
pub fn gather_metrics() -> String {
    REGISTER.call_once(|| {
        if let Err(e) = register_custom_metrics(&REGISTRY) {
            error!(error = %e, "could not register metrics");
        }
    });

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        error!(error = %e, "could not encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub(crate) fn record_event(event: &ChangeEvent) {
    CHANGE_EVENTS_EMITTED.with_label_values(&[event.kind.as_str()]).inc();
}

pub(crate) fn record_skip(reason: &str) {
    KEYS_SKIPPED.with_label_values(&[reason]).inc();
}

pub(crate) fn record_session(transition: &str) {
    SESSION_TRANSITIONS.with_label_values(&[transition]).inc();
}

pub(crate) fn record_lookup(outcome: &str) {
    POINT_LOOKUPS.with_label_values(&[outcome]).inc();
}
