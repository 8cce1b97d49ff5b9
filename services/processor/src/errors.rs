use shared::errors::{ErrorCategory, ErrorCode, ServiceError};
use shared::store::StoreError;
use shared::{BetId, DomainError, JackpotId};
use thiserror::Error;

/// Failures of the bet processing pipeline
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Jackpot not found: {0}")]
    JackpotNotFound(JackpotId),

    #[error("Bet {bet_id} lost the optimistic-lock race {attempts} times")]
    RetriesExhausted { bet_id: BetId, attempts: u32 },

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Malformed stream entry {entry_id}: {reason}")]
    MalformedMessage { entry_id: String, reason: String },
}

impl ProcessingError {
    /// Transient failures are left on the stream for redelivery; the rest are
    /// acknowledged and dropped.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProcessingError::RetriesExhausted { .. }
                | ProcessingError::Store(StoreError::Unavailable(_))
                | ProcessingError::Store(StoreError::VersionConflict { .. })
        )
    }
}

impl From<StoreError> for ProcessingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::JackpotNotFound(id) => ProcessingError::JackpotNotFound(id),
            other => ProcessingError::Store(other),
        }
    }
}

impl From<ProcessingError> for ServiceError {
    fn from(error: ProcessingError) -> Self {
        match &error {
            ProcessingError::Domain(domain) => domain.clone().into(),
            ProcessingError::JackpotNotFound(id) => ServiceError::jackpot_not_found(id),
            ProcessingError::RetriesExhausted { .. } => ServiceError::new(
                ErrorCategory::Conflict,
                ErrorCode::CONFLICT_JACKPOT_VERSION,
                error.to_string(),
            ),
            ProcessingError::Store(StoreError::Unavailable(reason)) => {
                ServiceError::redis_error(reason)
            }
            ProcessingError::Store(_) | ProcessingError::MalformedMessage { .. } => {
                ServiceError::internal(error.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let exhausted = ProcessingError::RetriesExhausted {
            bet_id: BetId::new(),
            attempts: 6,
        };
        assert!(exhausted.is_retryable());
        assert!(ProcessingError::Store(StoreError::Unavailable("down".into())).is_retryable());

        assert!(!ProcessingError::JackpotNotFound(JackpotId::new()).is_retryable());
        assert!(!ProcessingError::Domain(DomainError::validation("bad")).is_retryable());
        assert!(!ProcessingError::Store(StoreError::Corrupt("x".into())).is_retryable());
    }

    #[test]
    fn test_missing_jackpot_maps_to_not_found() {
        let id = JackpotId::new();
        let error: ProcessingError = StoreError::JackpotNotFound(id).into();
        assert!(matches!(error, ProcessingError::JackpotNotFound(found) if found == id));

        let service: ServiceError = error.into();
        assert_eq!(service.category, ErrorCategory::NotFound);
    }

    #[test]
    fn test_exhaustion_is_a_conflict() {
        let service: ServiceError = ProcessingError::RetriesExhausted {
            bet_id: BetId::new(),
            attempts: 3,
        }
        .into();
        assert_eq!(service.category, ErrorCategory::Conflict);
        assert_eq!(service.code, "CONFLICT_JACKPOT_VERSION");
    }
}
