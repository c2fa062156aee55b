//! Configuration for the requeue sweep.

use serde::{Deserialize, Serialize};

/// Configuration for the periodic requeue sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Whether the sweep runs in `serve`
    pub enabled: bool,
    /// Seconds between sweep cycles
    pub interval_seconds: u64,
    /// Reassign ACTIVE orders held longer than this; unset disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_assignment_seconds: Option<u64>,
    /// Poll every registered source at the start of each cycle
    pub pull_sources: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 30,
            stale_assignment_seconds: None,
            pull_sources: true,
        }
    }
}
