//! Error types shared by both services.
//!
//! `DomainError` comes out of the value types, strategies and the jackpot
//! aggregate and carries only the reason. `ServiceError` is what the adapters
//! report: a category, a stable code and a message.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures raised by the jackpot domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Currencies must be equal [{left} != {right}]")]
    CurrencyMismatch { left: String, right: String },

    #[error("Invalid percentage: {0}")]
    InvalidPercentage(String),

    #[error("Invalid decay factor: {0}")]
    InvalidDecayFactor(String),

    #[error("Invalid {kind}: {reason}")]
    InvalidId { kind: &'static str, reason: String },

    #[error("Cycle number must be >= 1, got {0}")]
    InvalidCycle(i64),

    #[error("Bet targets jackpot {bet_jackpot} but was applied to jackpot {jackpot}")]
    TargetMismatch { bet_jackpot: String, jackpot: String },

    #[error("{0}")]
    Validation(String),

    #[error("Invalid strategy configuration: {0}")]
    InvalidConfig(String),
}

impl DomainError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Error code used when reporting this failure through a `ServiceError`
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::InvalidAmount(_) => ErrorCode::VALIDATION_INVALID_AMOUNT,
            DomainError::InvalidCurrency(_) => ErrorCode::VALIDATION_INVALID_CURRENCY,
            DomainError::CurrencyMismatch { .. } => ErrorCode::VALIDATION_CURRENCY_MISMATCH,
            DomainError::InvalidPercentage(_) | DomainError::InvalidDecayFactor(_) => {
                ErrorCode::VALIDATION_INVALID_RATE
            }
            DomainError::InvalidId { .. } => ErrorCode::VALIDATION_INVALID_ID,
            DomainError::InvalidCycle(_) => ErrorCode::VALIDATION_INVALID_CYCLE,
            DomainError::TargetMismatch { .. } => ErrorCode::VALIDATION_TARGET_MISMATCH,
            DomainError::Validation(_) => ErrorCode::VALIDATION_PRECONDITION,
            DomainError::InvalidConfig(_) => ErrorCode::INTERNAL_CONFIGURATION,
        }
    }
}

/// How an adapter reports a failure: the category picks the HTTP status and
/// the log severity, the code is stable for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Rejected input, never retried
    Validation,
    /// Redis unreachable or timing out
    Network,
    /// Lost an optimistic-concurrency race on a jackpot
    Conflict,
    Internal,
    NotFound,
}

impl ErrorCategory {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
            Self::Network => 503,
        }
    }
}

/// Stable `<CATEGORY>_<DETAIL>` identifier carried in error bodies and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

macro_rules! error_codes {
    ($($name:ident),+ $(,)?) => {
        impl ErrorCode {
            $(pub const $name: ErrorCode = ErrorCode(stringify!($name));)+
        }
    };
}

error_codes! {
    VALIDATION_INVALID_ID,
    VALIDATION_INVALID_AMOUNT,
    VALIDATION_INVALID_CURRENCY,
    VALIDATION_CURRENCY_MISMATCH,
    VALIDATION_INVALID_RATE,
    VALIDATION_INVALID_CYCLE,
    VALIDATION_TARGET_MISMATCH,
    VALIDATION_PRECONDITION,
    VALIDATION_INVALID_INPUT,
    NETWORK_REDIS_CONNECTION,
    CONFLICT_JACKPOT_VERSION,
    INTERNAL_UNEXPECTED,
    INTERNAL_SERIALIZATION,
    INTERNAL_CONFIGURATION,
    NOT_FOUND_JACKPOT,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Failure as reported at a service boundary (HTTP body, worker log line)
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("[{code}] {message}{}", detail_suffix(.context))]
pub struct ServiceError {
    pub category: ErrorCategory,
    pub code: String,
    pub message: String,
    /// Underlying cause or identifiers, kept out of the client message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn detail_suffix(context: &Option<String>) -> String {
    context
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

impl ServiceError {
    pub fn new(category: ErrorCategory, code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            category,
            code: code.to_string(),
            message: message.into(),
            context: None,
        }
    }

    fn caused_by(self, cause: impl fmt::Display) -> Self {
        ServiceError {
            context: Some(cause.to_string()),
            ..self
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, ErrorCode::VALIDATION_INVALID_INPUT, message)
    }

    pub fn redis_error(cause: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Network,
            ErrorCode::NETWORK_REDIS_CONNECTION,
            "Jackpot store unavailable",
        )
        .caused_by(cause)
    }

    pub fn version_conflict(jackpot_id: impl fmt::Display, expected_version: u64) -> Self {
        Self::new(
            ErrorCategory::Conflict,
            ErrorCode::CONFLICT_JACKPOT_VERSION,
            format!("Jackpot {jackpot_id} was modified concurrently"),
        )
        .caused_by(format_args!("expected version {expected_version}"))
    }

    pub fn jackpot_not_found(jackpot_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_JACKPOT,
            format!("Unknown jackpot {jackpot_id}"),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, ErrorCode::INTERNAL_UNEXPECTED, message)
    }

    pub fn serialization_error(cause: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_SERIALIZATION,
            "Stored record could not be decoded",
        )
        .caused_by(cause)
    }
}

impl From<DomainError> for ServiceError {
    fn from(error: DomainError) -> Self {
        let category = if matches!(error, DomainError::InvalidConfig(_)) {
            ErrorCategory::Internal
        } else {
            ErrorCategory::Validation
        };
        Self::new(category, error.code(), error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
