//! Error type for a reconcile pass

use thiserror::Error;

use crate::store::StoreError;

/// One or more sub-operations of a reconcile pass failed.
///
/// The pass always runs to completion; the driver logs this error and
/// relies on the next reconcile event to re-converge.
#[derive(Debug, Error)]
#[error("reconcile finished with {} failed operation(s)", .errors.len())]
pub struct ReconcileError {
    pub errors: Vec<StoreError>,
}

impl ReconcileError {
    pub(crate) fn single(error: StoreError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}
