use crate::Error;
use crate::FilterConfig;
use crate::Result;

/// Namespace isolation boundary.
///
/// A key is observable iff it starts with the configured namespace
/// (case-sensitive, exact prefix, no wildcards). The same filter guards point
/// lookups and the change stream. An empty namespace matches every key;
/// [`FilterConfig::validate`] refuses it unless explicitly allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    namespace: String,
}

impl KeyFilter {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.namespace.clone())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn is_observable(
        &self,
        key: &str,
    ) -> bool {
        key.starts_with(self.namespace.as_str())
    }

    /// `Err(AccessDenied)` for keys outside the namespace.
    pub fn check(
        &self,
        key: &str,
    ) -> Result<()> {
        if self.is_observable(key) {
            Ok(())
        } else {
            Err(Error::AccessDenied {
                key: key.to_string(),
            })
        }
    }
}
