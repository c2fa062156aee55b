//! Caller roster module.
//!
//! Callers are owned by the session/admin authority; the engine only reads
//! them. [`CallerDirectory`] is the seam the engine depends on and [`Roster`]
//! is the thread-safe in-memory implementation used by the CLI and tests.

mod caller;
mod error;
#[cfg(test)]
mod tests;

pub use caller::*;
pub use error::*;

use dashmap::DashMap;

/// Read-only view of the caller pool.
pub trait CallerDirectory: Send + Sync + 'static {
    /// Look up a caller by id, active or not.
    fn caller(&self, id: &str) -> Option<Caller>;

    /// All callers currently eligible for new assignments.
    fn active_callers(&self) -> Vec<Caller>;

    /// Every known caller, active or not.
    fn all_callers(&self) -> Vec<Caller>;
}

/// In-memory caller directory.
///
/// Uses a concurrent map (DashMap) so status flips from the admin side never
/// block allocation reads.
///
/// # Examples
///
/// ```
/// use dispatch::roster::{Caller, Roster};
///
/// let roster = Roster::new();
/// roster
///     .add_caller(Caller::new("caller-1".to_string(), "Priya".to_string()))
///     .unwrap();
/// assert_eq!(roster.caller_count(), 1);
/// ```
pub struct Roster {
    callers: DashMap<String, Caller>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self {
            callers: DashMap::new(),
        }
    }

    /// Add a caller.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::DuplicateCaller` if a caller with the same id exists.
    pub fn add_caller(&self, caller: Caller) -> Result<(), RosterError> {
        match self.callers.entry(caller.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RosterError::DuplicateCaller(caller.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(caller);
                Ok(())
            }
        }
    }

    /// Get a caller by id.
    pub fn get_caller(&self, id: &str) -> Option<Caller> {
        self.callers.get(id).map(|entry| entry.value().clone())
    }

    /// All callers, sorted by id.
    pub fn all_callers(&self) -> Vec<Caller> {
        let mut callers: Vec<Caller> = self
            .callers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        callers.sort_by(|a, b| a.id.cmp(&b.id));
        callers
    }

    /// Number of callers, active or not.
    pub fn caller_count(&self) -> usize {
        self.callers.len()
    }

    /// Activate or deactivate a caller.
    ///
    /// Deactivation does not touch orders already in the caller's queue.
    pub fn set_status(&self, id: &str, status: CallerStatus) -> Result<(), RosterError> {
        let mut caller = self
            .callers
            .get_mut(id)
            .ok_or_else(|| RosterError::CallerNotFound(id.to_string()))?;

        if caller.status != status {
            tracing::info!(
                caller_id = %id,
                old_status = %caller.status,
                new_status = %status,
                "Caller status changed"
            );
        }
        caller.status = status;
        Ok(())
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl CallerDirectory for Roster {
    fn caller(&self, id: &str) -> Option<Caller> {
        self.get_caller(id)
    }

    fn active_callers(&self) -> Vec<Caller> {
        let mut callers: Vec<Caller> = self
            .callers
            .iter()
            .filter(|entry| entry.value().is_active())
            .map(|entry| entry.value().clone())
            .collect();
        callers.sort_by(|a, b| a.id.cmp(&b.id));
        callers
    }

    fn all_callers(&self) -> Vec<Caller> {
        Roster::all_callers(self)
    }
}
