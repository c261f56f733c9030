//! Errors surfaced by engine operations.

use recon_types::{EmptyInitialsError, LifecycleState, VehicleId};
use thiserror::Error;

use crate::store::{CollectionKey, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vehicle {0} not found")]
    NotFound(VehicleId),
    #[error("vehicle {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: VehicleId,
        from: LifecycleState,
        to: LifecycleState,
    },
    #[error("an actor is required for this operation")]
    MissingActor,
    #[error("failed to encode collection {key}: {source}")]
    Serialization {
        key: CollectionKey,
        source: serde_json::Error,
    },
    #[error("vehicle {0} already exists")]
    DuplicateVehicle(VehicleId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<EmptyInitialsError> for EngineError {
    fn from(_: EmptyInitialsError) -> Self {
        Self::MissingActor
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
