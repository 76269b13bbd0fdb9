//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Coarse classification of a failure, used by the boundary to pick a
/// transport status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    InvalidInput,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// HTTP-class status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::InvalidInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

/// Machine-readable reason key attached to every domain error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    Unauthorized,
    Forbidden,
    InvalidId,
    ValidationFailed,
    InvalidDateRange,
    PastStartDate,
    InvalidSortParam,
    InvalidQuantity,
    UserNotFound,
    PromotionNotFound,
    ProductNotFound,
    CannotDeleteActivePromotion,
    InsufficientStock,
    AlreadyExists,
    Internal,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Unauthorized => "UNAUTHORIZED",
            Reason::Forbidden => "FORBIDDEN",
            Reason::InvalidId => "INVALID_ID",
            Reason::ValidationFailed => "VALIDATION_FAILED",
            Reason::InvalidDateRange => "INVALID_DATE_RANGE",
            Reason::PastStartDate => "PAST_START_DATE",
            Reason::InvalidSortParam => "INVALID_SORT_PARAM",
            Reason::InvalidQuantity => "INVALID_QUANTITY",
            Reason::UserNotFound => "USER_NOT_FOUND",
            Reason::PromotionNotFound => "PROMOTION_NOT_FOUND",
            Reason::ProductNotFound => "PRODUCT_NOT_FOUND",
            Reason::CannotDeleteActivePromotion => "CANNOT_DELETE_ACTIVE_PROMOTION",
            Reason::InsufficientStock => "INSUFFICIENT_STOCK",
            Reason::AlreadyExists => "ALREADY_EXISTS",
            Reason::Internal => "INTERNAL",
        }
    }
}

impl core::fmt::Display for Reason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level error.
///
/// Every variant maps to exactly one [`ErrorKind`] and carries a [`Reason`]
/// key. Infrastructure failures reach callers only as `Internal`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No authenticated principal.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated principal lacks the permission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed or missing input (bad id, bad field, bad sort parameter).
    #[error("invalid input ({reason}): {message}")]
    InvalidInput { reason: Reason, message: String },

    /// The addressed entity does not exist.
    #[error("not found ({0})")]
    NotFound(Reason),

    /// The request conflicts with current state.
    #[error("conflict ({reason}): {message}")]
    Conflict { reason: Reason, message: String },

    /// Unexpected persistence failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_input(reason: Reason, msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason,
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::invalid_input(Reason::ValidationFailed, msg)
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::invalid_input(Reason::InvalidId, msg)
    }

    pub fn conflict(reason: Reason, msg: impl Into<String>) -> Self {
        Self::Conflict {
            reason,
            message: msg.into(),
        }
    }

    pub fn not_found(reason: Reason) -> Self {
        Self::NotFound(reason)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Unauthorized => ErrorKind::Unauthorized,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::InvalidInput { .. } => ErrorKind::InvalidInput,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict { .. } => ErrorKind::Conflict,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn reason(&self) -> Reason {
        match self {
            DomainError::Unauthorized => Reason::Unauthorized,
            DomainError::Forbidden(_) => Reason::Forbidden,
            DomainError::InvalidInput { reason, .. } => *reason,
            DomainError::NotFound(reason) => *reason,
            DomainError::Conflict { reason, .. } => *reason,
            DomainError::Internal(_) => Reason::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}
