use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::DEFAULT_NAMESPACE;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Key prefix a key must start with to be observable or readable
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Permit the empty namespace, which exposes every key in the store
    #[serde(default)]
    pub allow_empty_namespace: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            allow_empty_namespace: false,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() && !self.allow_empty_namespace {
            return Err(Error::InvalidConfig(
                "filter.namespace is empty; set filter.allow_empty_namespace to expose every key"
                    .to_string(),
            ));
        }
        if self.namespace.trim() != self.namespace {
            return Err(Error::InvalidConfig(format!(
                "filter.namespace '{}' has leading or trailing whitespace",
                self.namespace
            )));
        }
        Ok(())
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}
