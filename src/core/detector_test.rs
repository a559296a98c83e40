use std::collections::HashMap;

use super::*;
use crate::test_utils;
use crate::Error;
use crate::MemoryStore;
use crate::MockPreferenceStore;
use crate::NativeValue;
use crate::PreferenceValue;
use crate::StoreError;

fn filter() -> KeyFilter {
    KeyFilter::new("IABTCF")
}

fn snapshot_of(entries: &[(&str, PreferenceValue)]) -> Snapshot {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn test_initial_snapshot_filters_and_orders() {
    test_utils::enable_logger();

    let store = MemoryStore::per_key().with_entries([
        ("IABTCF_TCString", NativeValue::from("CPxx")),
        ("OTHER_KEY", NativeValue::from("x")),
        ("IABTCF_CmpSdkID", NativeValue::Int(300)),
        ("IABTCF_Blob", NativeValue::Opaque("<NSObject: 0x1>".into())),
    ]);
    let filter = filter();
    let detector = ChangeDetector::new(&store, &filter);

    let (snapshot, events) = detector.initial_snapshot().unwrap();

    assert_eq!(snapshot.len(), 2);
    assert!(!snapshot.contains_key("OTHER_KEY"));
    assert!(!snapshot.contains_key("IABTCF_Blob"));
    assert_eq!(
        events,
        vec![
            ChangeEvent::added("IABTCF_CmpSdkID", PreferenceValue::Integer(300)),
            ChangeEvent::added("IABTCF_TCString", PreferenceValue::String("CPxx".into())),
        ]
    );
}

#[test]
fn test_initial_snapshot_propagates_read_failure() {
    let mut store = MockPreferenceStore::new();
    store
        .expect_read_all()
        .times(1)
        .returning(|| Err(StoreError::ReadAll("boom".into()).into()));
    let filter = filter();

    let result = ChangeDetector::new(&store, &filter).initial_snapshot();
    assert!(matches!(result, Err(Error::NativeStore(_))));
}

#[test]
fn test_keyed_add_update_noop_remove() {
    let store = MemoryStore::per_key();
    let filter = filter();
    let detector = ChangeDetector::new(&store, &filter);
    let mut snapshot = Snapshot::new();

    store.put("IABTCF_gdprApplies", 1i32);
    assert_eq!(
        detector.detect(DetectionMode::Keyed("IABTCF_gdprApplies"), &mut snapshot),
        vec![ChangeEvent::added("IABTCF_gdprApplies", PreferenceValue::Integer(1))]
    );

    // Same logical value, different native width: still no event
    store.put("IABTCF_gdprApplies", 1i64);
    assert!(detector
        .detect(DetectionMode::Keyed("IABTCF_gdprApplies"), &mut snapshot)
        .is_empty());

    store.put("IABTCF_gdprApplies", 0i32);
    assert_eq!(
        detector.detect(DetectionMode::Keyed("IABTCF_gdprApplies"), &mut snapshot),
        vec![ChangeEvent::updated("IABTCF_gdprApplies", PreferenceValue::Integer(0))]
    );

    store.remove("IABTCF_gdprApplies");
    assert_eq!(
        detector.detect(DetectionMode::Keyed("IABTCF_gdprApplies"), &mut snapshot),
        vec![ChangeEvent::removed("IABTCF_gdprApplies")]
    );
    assert!(snapshot.is_empty());

    // Absent in both: nothing
    assert!(detector
        .detect(DetectionMode::Keyed("IABTCF_gdprApplies"), &mut snapshot)
        .is_empty());
}

#[test]
fn test_keyed_ignores_keys_outside_namespace() {
    let mut store = MockPreferenceStore::new();
    store.expect_read_one().never();
    let filter = filter();
    let mut snapshot = Snapshot::new();

    let events =
        ChangeDetector::new(&store, &filter).detect(DetectionMode::Keyed("OTHER_KEY"), &mut snapshot);
    assert!(events.is_empty());
}

#[test]
fn test_keyed_read_error_skips_key() {
    let mut store = MockPreferenceStore::new();
    store.expect_read_one().times(1).returning(|key| {
        Err(StoreError::Read {
            key: key.to_string(),
            reason: "io".into(),
        }
        .into())
    });
    let filter = filter();
    let mut snapshot = snapshot_of(&[("IABTCF_TCString", "old".into())]);

    let events = ChangeDetector::new(&store, &filter)
        .detect(DetectionMode::Keyed("IABTCF_TCString"), &mut snapshot);

    assert!(events.is_empty());
    assert_eq!(snapshot.get("IABTCF_TCString"), Some(&PreferenceValue::from("old")));
}

#[test]
fn test_keyed_unrepresentable_value_is_skipped() {
    let store = MemoryStore::per_key()
        .with_entries([("IABTCF_Blob", NativeValue::Opaque("<Foo: 0x2>".into()))]);
    let filter = filter();
    let mut snapshot = snapshot_of(&[("IABTCF_Blob", "previous".into())]);

    let events =
        ChangeDetector::new(&store, &filter).detect(DetectionMode::Keyed("IABTCF_Blob"), &mut snapshot);

    assert!(events.is_empty());
    assert_eq!(snapshot.get("IABTCF_Blob"), Some(&PreferenceValue::from("previous")));
}

/// {A:"1", B:"2"} → {A:"1", C:"3"} without a key hint.
#[test]
fn test_whole_store_diff_emits_remove_then_add_in_key_order() {
    let store = MemoryStore::whole_store().with_entries([("A", "1"), ("C", "3")]);
    let filter = KeyFilter::new("");
    let mut snapshot = snapshot_of(&[("A", "1".into()), ("B", "2".into())]);

    let events =
        ChangeDetector::new(&store, &filter).detect(DetectionMode::WholeStore, &mut snapshot);

    assert_eq!(
        events,
        vec![
            ChangeEvent::removed("B"),
            ChangeEvent::added("C", PreferenceValue::String("3".into())),
        ]
    );
    assert_eq!(snapshot, snapshot_of(&[("A", "1".into()), ("C", "3".into())]));
}

/// Fresh native instances of equal values must not produce events.
#[test]
fn test_whole_store_uses_value_equality() {
    let mut store = MockPreferenceStore::new();
    store.expect_read_all().times(3).returning(|| {
        let mut all = HashMap::new();
        all.insert(
            "IABTCF_PurposeConsents".to_string(),
            NativeValue::string_set(["1", "3", "2"]),
        );
        all.insert("IABTCF_PublisherCC".to_string(), NativeValue::from("DE"));
        all.insert("IABTCF_Ratio".to_string(), NativeValue::Double(f64::NAN));
        Ok(all)
    });
    let filter = filter();
    let detector = ChangeDetector::new(&store, &filter);
    let mut snapshot = Snapshot::new();

    assert_eq!(detector.detect(DetectionMode::WholeStore, &mut snapshot).len(), 3);
    assert!(detector.detect(DetectionMode::WholeStore, &mut snapshot).is_empty());
    assert!(detector.detect(DetectionMode::WholeStore, &mut snapshot).is_empty());
}

#[test]
fn test_whole_store_ignores_other_namespaces() {
    let store = MemoryStore::whole_store().with_entries([
        ("OTHER_KEY", NativeValue::from("x")),
        ("IABTCF_TCString", NativeValue::from("CPxx")),
    ]);
    let filter = filter();
    let mut snapshot = Snapshot::new();

    let events =
        ChangeDetector::new(&store, &filter).detect(DetectionMode::WholeStore, &mut snapshot);

    assert_eq!(
        events,
        vec![ChangeEvent::added("IABTCF_TCString", PreferenceValue::from("CPxx"))]
    );
}

#[test]
fn test_whole_store_full_read_failure_emits_nothing() {
    let mut store = MockPreferenceStore::new();
    store
        .expect_read_all()
        .returning(|| Err(StoreError::Unavailable("detached".into()).into()));
    let filter = filter();
    let mut snapshot = snapshot_of(&[("IABTCF_TCString", "CPxx".into())]);

    let events =
        ChangeDetector::new(&store, &filter).detect(DetectionMode::WholeStore, &mut snapshot);

    assert!(events.is_empty());
    // Not mistaken for a removal
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_whole_store_unrepresentable_value_keeps_snapshot_entry() {
    let store = MemoryStore::whole_store().with_entries([
        ("IABTCF_A", NativeValue::Opaque("<Foo: 0x3>".into())),
        ("IABTCF_B", NativeValue::from("new")),
    ]);
    let filter = filter();
    let mut snapshot = snapshot_of(&[("IABTCF_A", "kept".into()), ("IABTCF_B", "old".into())]);

    let events =
        ChangeDetector::new(&store, &filter).detect(DetectionMode::WholeStore, &mut snapshot);

    assert_eq!(events, vec![ChangeEvent::updated("IABTCF_B", PreferenceValue::from("new"))]);
    assert_eq!(snapshot.get("IABTCF_A"), Some(&PreferenceValue::from("kept")));
}

#[test]
fn test_detection_mode_from_notification() {
    assert_eq!(DetectionMode::from(Some("k")), DetectionMode::Keyed("k"));
    assert_eq!(DetectionMode::from(None), DetectionMode::WholeStore);
}
