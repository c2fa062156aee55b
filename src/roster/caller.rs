use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a caller may receive new assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerStatus {
    /// Working; eligible for new orders
    #[default]
    Active,
    /// Off shift or deactivated; keeps existing queue entries but gets nothing new
    Inactive,
}

impl FromStr for CallerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(CallerStatus::Active),
            "inactive" => Ok(CallerStatus::Inactive),
            _ => Err(format!("Unknown caller status: {}", s)),
        }
    }
}

impl fmt::Display for CallerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerStatus::Active => write!(f, "active"),
            CallerStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A verification agent.
///
/// # Examples
///
/// ```
/// use dispatch::roster::{Caller, CallerStatus};
///
/// let caller = Caller::new("caller-1".to_string(), "Priya".to_string());
/// assert_eq!(caller.status, CallerStatus::Active);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Unique identifier supplied by the session authority
    pub id: String,
    /// Display name
    pub name: String,
    pub status: CallerStatus,
    /// When the caller was added to the roster
    pub created_at: DateTime<Utc>,
}

impl Caller {
    /// Create an active caller.
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            status: CallerStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Builder-style status override.
    pub fn with_status(mut self, status: CallerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == CallerStatus::Active
    }
}
