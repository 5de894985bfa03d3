//! Scan and model lifecycle state machines.
//!
//! Pure transition checks only. The engine pairs these with store-level
//! atomic claims so that concurrent callers observe exactly one successful
//! transition; nothing here mutates state.

use crate::enums::{ModelStatus, ScanStatus};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Scan lifecycle
// ---------------------------------------------------------------------------

/// States from which no further transition is defined.
pub fn is_terminal(status: ScanStatus) -> bool {
    matches!(
        status,
        ScanStatus::Completed | ScanStatus::Failed | ScanStatus::Stopped
    )
}

/// A scan may only be started from `pending`.
pub fn can_start(status: ScanStatus) -> bool {
    status == ScanStatus::Pending
}

/// A scan may only be stopped while `running`. Stopping from any other
/// state is an invalid operation, not a no-op.
pub fn can_stop(status: ScanStatus) -> bool {
    status == ScanStatus::Running
}

/// Validate a scan status transition.
///
/// Allowed transitions:
/// - `pending -> running` (explicit start)
/// - `running -> completed` (adapter success, findings normalized)
/// - `running -> failed` (adapter failure or unexpected fault)
/// - `running -> stopped` (explicit stop request)
pub fn validate_transition(from: ScanStatus, to: ScanStatus) -> Result<(), CoreError> {
    let allowed = matches!(
        (from, to),
        (ScanStatus::Pending, ScanStatus::Running)
            | (ScanStatus::Running, ScanStatus::Completed)
            | (ScanStatus::Running, ScanStatus::Failed)
            | (ScanStatus::Running, ScanStatus::Stopped)
    );
    if allowed {
        Ok(())
    } else {
        Err(CoreError::StateConflict(format!(
            "Cannot transition scan from '{from}' to '{to}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Model lifecycle
// ---------------------------------------------------------------------------

/// Whether a training run may claim this model.
///
/// A model already `training` must be refused — the `training` status is
/// the mutual-exclusion claim itself.
pub fn can_claim_training(status: ModelStatus) -> bool {
    status != ModelStatus::Training
}

/// Validate a model status transition.
///
/// Allowed transitions:
/// - `created | trained | error -> training` (claim at fit start; retraining
///   an already-trained model is permitted and overwrites its payload)
/// - `training -> trained` (fit succeeded, payload present)
/// - `training -> error` (fit failed, no payload written)
pub fn validate_model_transition(from: ModelStatus, to: ModelStatus) -> Result<(), CoreError> {
    let allowed = matches!(
        (from, to),
        (ModelStatus::Created, ModelStatus::Training)
            | (ModelStatus::Trained, ModelStatus::Training)
            | (ModelStatus::Error, ModelStatus::Training)
            | (ModelStatus::Training, ModelStatus::Trained)
            | (ModelStatus::Training, ModelStatus::Error)
    );
    if allowed {
        Ok(())
    } else {
        Err(CoreError::StateConflict(format!(
            "Cannot transition model from '{from}' to '{to}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
