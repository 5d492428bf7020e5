use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The operation is not valid for the subscription's current status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found")]
    NotFound,

    /// The store rejected a stale transition (concurrent modification).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidState,
    InvalidArgument,
    NotFound,
    Conflict,
    DeliveryFailed,
    Unauthorized,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::DeliveryFailed => "DELIVERY_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidState(_) => ErrorCode::InvalidState,
            AppError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Delivery(_) => ErrorCode::DeliveryFailed,
            AppError::Unauthorized => ErrorCode::Unauthorized,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
