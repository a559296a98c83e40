use std::collections::BTreeMap;
use std::time::Duration;
use std::time::UNIX_EPOCH;

use super::*;
use crate::test_utils;

#[test]
fn test_scalars_pass_through() {
    assert_eq!(serialize(&NativeValue::Null), PreferenceValue::Null);
    assert_eq!(serialize(&NativeValue::Bool(true)), PreferenceValue::Bool(true));
    assert_eq!(serialize(&NativeValue::Int(-7)), PreferenceValue::Integer(-7));
    assert_eq!(
        serialize(&NativeValue::Long(i64::MAX)),
        PreferenceValue::Integer(i64::MAX)
    );
    assert_eq!(serialize(&NativeValue::Double(2.5)), PreferenceValue::Float64(2.5));
    assert_eq!(
        serialize(&NativeValue::from("CPxx")),
        PreferenceValue::String("CPxx".into())
    );
}

/// f32 widens exactly, it is not re-parsed from its decimal form.
#[test]
fn test_float_widening_is_pinned() {
    let value = serialize(&NativeValue::Float(3.14f32));
    assert_eq!(value, PreferenceValue::Float64(3.140000104904175));
    assert_ne!(value, PreferenceValue::Float64(3.14));
}

#[test]
fn test_bytes_become_base64() {
    let value = serialize(&NativeValue::Data(b"hello".to_vec()));
    assert_eq!(value, PreferenceValue::Bytes("aGVsbG8=".into()));
    assert_eq!(value.decode_bytes(), Some(b"hello".to_vec()));

    assert_eq!(
        serialize(&NativeValue::Data(Vec::new())),
        PreferenceValue::Bytes(String::new())
    );
}

#[test]
fn test_dates_become_epoch_millis() {
    let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
    assert_eq!(
        serialize(&NativeValue::Date(at)),
        PreferenceValue::Float64(1_700_000_000_123.0)
    );

    let half_ms = UNIX_EPOCH + Duration::from_micros(1_500);
    assert_eq!(serialize(&NativeValue::Date(half_ms)), PreferenceValue::Float64(1.5));

    let before = UNIX_EPOCH - Duration::from_millis(2_000);
    assert_eq!(serialize(&NativeValue::Date(before)), PreferenceValue::Float64(-2_000.0));
}

#[test]
fn test_url_becomes_string() {
    assert_eq!(
        serialize(&NativeValue::Url("https://example.com/a?b=c".into())),
        PreferenceValue::String("https://example.com/a?b=c".into())
    );
}

#[test]
fn test_string_set_is_sorted_list() {
    let value = serialize(&NativeValue::string_set(["b", "c", "a"]));
    assert_eq!(
        value,
        PreferenceValue::ListOfString(vec!["a".into(), "b".into(), "c".into()])
    );
}

#[test]
fn test_string_array_passes_through_in_order() {
    let value = serialize(&NativeValue::Array(vec!["z".into(), "a".into()]));
    assert_eq!(value, PreferenceValue::ListOfString(vec!["z".into(), "a".into()]));
}

#[test]
fn test_heterogeneous_array_drops_meaningless_elements() {
    test_utils::enable_logger();

    let value = serialize(&NativeValue::Array(vec![
        "a".into(),
        NativeValue::Int(1),
        NativeValue::Bool(false),
        NativeValue::Null,
        NativeValue::Opaque("<NSObject: 0x600000>".into()),
        NativeValue::Array(vec!["nested".into()]),
        NativeValue::Data(vec![0xff]),
    ]));

    assert_eq!(
        value,
        PreferenceValue::ListOfString(vec![
            "a".into(),
            "1".into(),
            "false".into(),
            "/w==".into(),
        ])
    );
}

#[test]
fn test_dictionary_recurses_and_drops_non_string_keys() {
    let value = serialize(&NativeValue::dictionary([
        (NativeValue::from("purpose"), NativeValue::Int(3)),
        (NativeValue::Int(9), NativeValue::from("dropped: key is not a string")),
        (NativeValue::from("opaque"), NativeValue::Opaque("".into())),
        (
            NativeValue::from("nested"),
            NativeValue::dictionary([("flag", true)]),
        ),
    ]));

    let mut nested = BTreeMap::new();
    nested.insert("flag".to_string(), PreferenceValue::Bool(true));
    let mut expected = BTreeMap::new();
    expected.insert("purpose".to_string(), PreferenceValue::Integer(3));
    expected.insert("nested".to_string(), PreferenceValue::Mapping(nested));

    assert_eq!(value, PreferenceValue::Mapping(expected));
}

#[test]
fn test_opaque_descriptions() {
    assert_eq!(try_serialize(&NativeValue::Opaque(String::new())), None);
    assert_eq!(try_serialize(&NativeValue::Opaque("   ".into())), None);
    assert_eq!(
        try_serialize(&NativeValue::Opaque("<UIColor: 0x1234>".into())),
        None
    );
    assert_eq!(
        try_serialize(&NativeValue::Opaque("Locale(en_US)".into())),
        Some(PreferenceValue::String("Locale(en_US)".into()))
    );

    // Total variant degrades to Null
    assert_eq!(
        serialize(&NativeValue::Opaque("<NSObject: 0x1>".into())),
        PreferenceValue::Null
    );
}

#[test]
fn test_serialize_entry_reports_skipped_key() {
    let err = serialize_entry("IABTCF_Blob", &NativeValue::Opaque("<x>".into())).unwrap_err();
    match err {
        crate::Error::SerializationSkipped { key } => assert_eq!(key, "IABTCF_Blob"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_serialize_is_pure() {
    let inputs = vec![
        NativeValue::string_set(["x", "y"]),
        NativeValue::Float(0.1),
        NativeValue::Double(f64::NAN),
        NativeValue::dictionary([("a", NativeValue::Array(vec![1i32.into(), "b".into()]))]),
    ];

    for input in inputs {
        let copy = input.clone();
        assert_eq!(serialize(&input), serialize(&copy), "input: {input:?}");
    }
}
