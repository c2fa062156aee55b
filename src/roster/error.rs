/// Errors that can occur during roster operations
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("caller already exists: {0}")]
    DuplicateCaller(String),

    #[error("caller not found: {0}")]
    CallerNotFound(String),
}
