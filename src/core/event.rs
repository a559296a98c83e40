use serde::Serialize;
use serde::Serializer;

use crate::PreferenceValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Key was not in the snapshot (includes the initial replay)
    Added,
    /// Key was in the snapshot with a different value
    Updated,
    /// Key disappeared from the store
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Updated => "updated",
            ChangeKind::Removed => "removed",
        }
    }
}

/// One observed key change.
///
/// `value` is `None` only for [`ChangeKind::Removed`]; a present key whose
/// value is `Null` carries `Some(PreferenceValue::Null)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: String,
    pub kind: ChangeKind,
    pub value: Option<PreferenceValue>,
}

impl ChangeEvent {
    pub fn added(
        key: impl Into<String>,
        value: PreferenceValue,
    ) -> Self {
        Self {
            key: key.into(),
            kind: ChangeKind::Added,
            value: Some(value),
        }
    }

    pub fn updated(
        key: impl Into<String>,
        value: PreferenceValue,
    ) -> Self {
        Self {
            key: key.into(),
            kind: ChangeKind::Updated,
            value: Some(value),
        }
    }

    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ChangeKind::Removed,
            value: None,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.kind == ChangeKind::Removed
    }

    /// Event-channel payload: `{"key": .., "value": .., "removed": ..}`
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

#[derive(Serialize)]
struct WireEvent<'a> {
    key: &'a str,
    value: Option<&'a PreferenceValue>,
    removed: bool,
}

impl Serialize for ChangeEvent {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        WireEvent {
            key: &self.key,
            value: self.value.as_ref(),
            removed: self.is_removal(),
        }
        .serialize(serializer)
    }
}
