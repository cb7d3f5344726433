//! Placement Errors
//!
//! Nothing in the placement engine is fatal. Lookups that fail during a
//! frame degrade to no-ops and are logged; the operations that a caller
//! drives directly (requests, admission, configuration) return these.

use thiserror::Error;

use super::entity::EntityId;
use super::session::StateKind;
use super::stroke::{StrokeCategory, StrokeType};

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("unknown piece id `{0}`")]
    UnknownPiece(String),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("cannot switch from {from:?} to {to:?}")]
    InvalidTransition { from: StateKind, to: StateKind },

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("no {archetype:?} piece registered for {category:?}")]
    MissingArchetype {
        category: StrokeCategory,
        archetype: StrokeType,
    },

    #[error("admission rejected: {0}")]
    Rejected(String),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
