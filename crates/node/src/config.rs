//! Node Configuration

use serde::{Deserialize, Serialize};

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Base-layer slot time in milliseconds
    pub slot_time_ms: u64,
    /// Slots between checkpoint passes
    pub checkpoint_interval_slots: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            slot_time_ms: 400,
            checkpoint_interval_slots: 100,
        }
    }
}
