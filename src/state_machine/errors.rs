use crate::actions::ActionError;
use thiserror::Error;

/// Errors internal to a lifecycle run. These never escape `run`: the run
/// boundary converts them into a structured `failed` outcome.
#[derive(Debug, Error)]
pub enum StateMachineError {
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    #[error(transparent)]
    Action(#[from] ActionError),
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
