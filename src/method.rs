//! Method-channel dispatch.
//!
//! Maps a named call with loosely typed arguments onto the observer and
//! folds the outcome into a success value or an `(code, message)` pair.

use std::fmt;

use tracing::debug;

use crate::Error;
use crate::PreferenceStore;
use crate::PreferenceValue;
use crate::PreferencesObserver;
use crate::Result;
use crate::GET_VALUE_METHOD;
use crate::KEY_ARGUMENT;

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    /// Usually a `Mapping` of named arguments
    pub arguments: Option<PreferenceValue>,
}

impl MethodCall {
    pub fn new(
        method: impl Into<String>,
        arguments: Option<PreferenceValue>,
    ) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// `getValue` with `{"key": key}`
    pub fn get_value(key: impl Into<String>) -> Self {
        let mut arguments = std::collections::BTreeMap::new();
        arguments.insert(KEY_ARGUMENT.to_string(), PreferenceValue::String(key.into()));
        Self::new(GET_VALUE_METHOD, Some(PreferenceValue::Mapping(arguments)))
    }

    /// Named string argument.
    pub fn string_argument(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.arguments.as_ref()?.as_mapping()?.get(name)?.as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(PreferenceValue),
    Error { code: String, message: String },
}

impl MethodResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success(_))
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResponse::Success(_) => None,
            MethodResponse::Error { code, .. } => Some(code),
        }
    }
}

impl From<Result<PreferenceValue>> for MethodResponse {
    fn from(result: Result<PreferenceValue>) -> Self {
        match result {
            Ok(value) => MethodResponse::Success(value),
            Err(e) => MethodResponse::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }
}

impl fmt::Display for MethodResponse {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            MethodResponse::Success(value) => write!(f, "{}", value.to_json_string()),
            MethodResponse::Error { code, message } => write!(f, "{code}: {message}"),
        }
    }
}

impl<S: PreferenceStore> PreferencesObserver<S> {
    pub fn handle_method_call(
        &self,
        call: &MethodCall,
    ) -> MethodResponse {
        debug!(method = %call.method, "Method call received");
        match call.method.as_str() {
            GET_VALUE_METHOD => self.get_value(call).into(),
            other => MethodResponse::from(Err(Error::NotImplemented(other.to_string()))),
        }
    }

    fn get_value(
        &self,
        call: &MethodCall,
    ) -> Result<PreferenceValue> {
        let key = call
            .string_argument(KEY_ARGUMENT)
            .ok_or_else(|| Error::InvalidArgument("Key is required".to_string()))?;
        self.lookup(key)
    }
}
