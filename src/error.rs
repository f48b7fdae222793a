use thiserror::Error;

use crate::id::{CitizenId, DiseaseId, MessageId, MovementId, PlayerId};

/// Coarse failure taxonomy callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    ValidationFailure,
}

/// Errors returned by core commands. None of them are fatal; the failed
/// command simply had no effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("citizen {0} not found")]
    CitizenNotFound(CitizenId),
    #[error("no session for player {0}")]
    SessionNotFound(PlayerId),
    #[error("movement {0} not found")]
    MovementNotFound(MovementId),
    #[error("disease {0} not found")]
    DiseaseNotFound(DiseaseId),
    #[error("message {0} not found")]
    MessageNotFound(MessageId),
    #[error("citizen {from} has no relationship to {to}")]
    RelationshipNotFound { from: CitizenId, to: CitizenId },

    #[error("citizen {0} is deceased")]
    CitizenDeceased(CitizenId),
    #[error("citizen {citizen} is already controlled by player {player}")]
    AlreadyControlled { citizen: CitizenId, player: PlayerId },
    #[error("player {0} is not embodying any citizen")]
    NoActiveCitizen(PlayerId),
    #[error("player {0} has no previous citizen to return to")]
    HistoryExhausted(PlayerId),
    #[error("citizens {a} and {b} already share a relationship")]
    RelationshipExists { a: CitizenId, b: CitizenId },
    #[error("movement {0} is no longer active")]
    MovementInactive(MovementId),

    #[error("invalid input: {0}")]
    Validation(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::CitizenNotFound(_)
            | SimError::SessionNotFound(_)
            | SimError::MovementNotFound(_)
            | SimError::DiseaseNotFound(_)
            | SimError::MessageNotFound(_)
            | SimError::RelationshipNotFound { .. } => ErrorKind::NotFound,
            SimError::CitizenDeceased(_)
            | SimError::AlreadyControlled { .. }
            | SimError::NoActiveCitizen(_)
            | SimError::HistoryExhausted(_)
            | SimError::RelationshipExists { .. }
            | SimError::MovementInactive(_) => ErrorKind::InvalidState,
            SimError::Validation(_) | SimError::Config(_) => ErrorKind::ValidationFailure,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
