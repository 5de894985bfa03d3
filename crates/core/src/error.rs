//! Error type shared by the pure domain logic.

/// Error type for domain validation and state-machine checks.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A value fell outside its enumerated or numeric domain.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation was requested from a state that does not permit it.
    #[error("Invalid operation: {0}")]
    StateConflict(String),
}
