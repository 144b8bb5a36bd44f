use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::NormalizedError;

/// Machine-readable failure categories understood by the classifier.
///
/// Codes outside this set are allowed on a [`NormalizedError`]; they simply
/// fail every predicate below.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed server-side validation.
    ValidationError,
    /// Requested resource does not exist.
    NotFound,
    /// Caller is not allowed to perform the operation.
    Unauthorized,
    /// Credentials were rejected.
    AuthenticationFailed,
    /// Resource with the same unique key already exists.
    DuplicateEntry,
    /// Not enough inventory to satisfy the request.
    InsufficientStock,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::ValidationError,
        ErrorCode::NotFound,
        ErrorCode::Unauthorized,
        ErrorCode::AuthenticationFailed,
        ErrorCode::DuplicateEntry,
        ErrorCode::InsufficientStock,
    ];

    /// Wire form of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorCode::DuplicateEntry => "DUPLICATE_ENTRY",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a string that is not part of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error code '{0}'")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == value)
            .ok_or_else(|| UnknownErrorCode(value.to_owned()))
    }
}

/// Whether `error` carries `code`. Absent errors never match.
pub fn is_error_type(error: Option<&NormalizedError>, code: &str) -> bool {
    error.is_some_and(|error| error.has_code(code))
}

fn has(error: Option<&NormalizedError>, code: ErrorCode) -> bool {
    is_error_type(error, code.as_str())
}

/// Input failed server-side validation.
pub fn is_validation_error(error: Option<&NormalizedError>) -> bool {
    has(error, ErrorCode::ValidationError)
}

/// The requested resource does not exist.
pub fn is_not_found_error(error: Option<&NormalizedError>) -> bool {
    has(error, ErrorCode::NotFound)
}

/// Authorization denied. Rejected credentials count as well, so this overlaps
/// with [`is_authentication_error`].
pub fn is_unauthorized_error(error: Option<&NormalizedError>) -> bool {
    has(error, ErrorCode::Unauthorized) || has(error, ErrorCode::AuthenticationFailed)
}

/// The resource already exists.
pub fn is_duplicate_error(error: Option<&NormalizedError>) -> bool {
    has(error, ErrorCode::DuplicateEntry)
}

/// Not enough stock to fulfil the request.
pub fn is_insufficient_stock_error(error: Option<&NormalizedError>) -> bool {
    has(error, ErrorCode::InsufficientStock)
}

/// Credentials were rejected.
pub fn is_authentication_error(error: Option<&NormalizedError>) -> bool {
    has(error, ErrorCode::AuthenticationFailed)
}
