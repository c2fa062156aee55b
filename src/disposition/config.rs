//! Configuration for the disposition set.

use super::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deployment overrides for disposition categories and transitions.
///
/// Both tables are optional. Omitted categories keep their built-in value;
/// when `transitions` is present it replaces the built-in edge set entirely.
///
/// # Example
///
/// ```toml
/// [dispositions.categories]
/// RESCHEDULED = "ACTIVE"
///
/// [dispositions.transitions]
/// NEW = ["NO_ANSWER", "CONFIRMED", "CANCELLED"]
/// NO_ANSWER = ["NO_ANSWER", "CONFIRMED", "CANCELLED"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispositionConfig {
    /// State name → category override
    pub categories: BTreeMap<String, Category>,
    /// State name → allowed next states
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitions: Option<BTreeMap<String, Vec<String>>>,
}
