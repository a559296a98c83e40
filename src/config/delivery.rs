use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

const MAX_CHANNEL_BUFFER_SIZE: usize = 1 << 20;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Capacity of the channel behind `observe_stream`; 0 means unbounded.
    /// A full bounded channel drops events instead of blocking the store.
    #[serde(default)]
    pub channel_buffer_size: usize,

    /// Run a whole-store pass right after the listener is registered, so
    /// mutations racing with session start are not lost
    #[serde(default = "default_resync_after_subscribe")]
    pub resync_after_subscribe: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 0,
            resync_after_subscribe: default_resync_after_subscribe(),
        }
    }
}

impl DeliveryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_buffer_size > MAX_CHANNEL_BUFFER_SIZE {
            return Err(Error::InvalidConfig(format!(
                "delivery.channel_buffer_size {} exceeds maximum {}",
                self.channel_buffer_size, MAX_CHANNEL_BUFFER_SIZE
            )));
        }
        Ok(())
    }
}

fn default_resync_after_subscribe() -> bool {
    true
}
