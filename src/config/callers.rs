//! Static caller roster configuration

use crate::roster::{Caller, CallerStatus};
use serde::{Deserialize, Serialize};

/// A caller seeded into the roster at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CallerConfig {
    pub fn to_caller(&self) -> Caller {
        let status = if self.active {
            CallerStatus::Active
        } else {
            CallerStatus::Inactive
        };
        Caller::new(self.id.clone(), self.name.clone()).with_status(status)
    }
}
