//! Store error type.

use vulnscan_core::types::EntityId;

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed entity does not exist.
    #[error("{entity} with ID {id} not found")]
    NotFound {
        entity: &'static str,
        id: EntityId,
    },

    /// A conditional transition found the entity in a state that does not
    /// permit the operation. Carries the rejection reason verbatim.
    #[error("Invalid operation: {0}")]
    StateConflict(String),
}

impl From<vulnscan_core::CoreError> for StoreError {
    fn from(err: vulnscan_core::CoreError) -> Self {
        Self::StateConflict(err.to_string())
    }
}
