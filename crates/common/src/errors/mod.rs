//! Error types for DealBridge services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling
//!
//! The taxonomy separates malformed input (the caller can fix the request)
//! from business-rule violations (the caller must re-fetch state). Storage
//! failures are surfaced with a generic message; the structured code is
//! preserved for programmatic handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingField,
    InvalidFormat,

    // Authentication errors (2xxx)
    Unauthorized,
    ExpiredToken,

    // Authorization errors (3xxx)
    Forbidden,
    AdminRequired,
    AccountDisabled,

    // Resource errors (4xxx)
    NotFound,
    ProposalNotFound,

    // State & conflict errors (5xxx)
    InvalidStatusTransition,
    NotReadyForSubmission,
    VersionConflict,
    AlreadyArchived,
    NotEditable,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // External service errors (8xxx)
    NotificationError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::InvalidFormat => 1003,

            // Auth (2xxx)
            ErrorCode::Unauthorized => 2001,
            ErrorCode::ExpiredToken => 2002,

            // Authz (3xxx)
            ErrorCode::Forbidden => 3001,
            ErrorCode::AdminRequired => 3002,
            ErrorCode::AccountDisabled => 3003,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::ProposalNotFound => 4002,

            // State & conflicts (5xxx)
            ErrorCode::InvalidStatusTransition => 5001,
            ErrorCode::NotReadyForSubmission => 5002,
            ErrorCode::VersionConflict => 5003,
            ErrorCode::AlreadyArchived => 5004,
            ErrorCode::NotEditable => 5005,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // External (8xxx)
            ErrorCode::NotificationError => 8001,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Token expired")]
    ExpiredToken,

    // Authorization errors
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Admin role required")]
    AdminRequired,

    #[error("Account is disabled")]
    AccountDisabled,

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Proposal not found: {id}")]
    ProposalNotFound { id: String },

    // State & conflict errors
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Proposal is not ready for submission; missing: {}", missing.join(", "))]
    NotReady { missing: Vec<String> },

    #[error("Version conflict on proposal {id}: expected version {expected}")]
    VersionConflict { id: String, expected: i64 },

    #[error("Proposal {id} is already archived")]
    AlreadyArchived { id: String },

    #[error("Proposal cannot be edited in status {status}")]
    NotEditable { status: String },

    // Database errors (generic message; persistence internals are not leaked)
    #[error("Storage operation failed")]
    Database(#[from] sea_orm::DbErr),

    #[error("Storage connection failed")]
    DatabaseConnection { message: String },

    // External service errors
    #[error("Notification delivery failed: {message}")]
    Notification { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::AdminRequired => ErrorCode::AdminRequired,
            AppError::AccountDisabled => ErrorCode::AccountDisabled,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::ProposalNotFound { .. } => ErrorCode::ProposalNotFound,
            AppError::InvalidTransition { .. } => ErrorCode::InvalidStatusTransition,
            AppError::NotReady { .. } => ErrorCode::NotReadyForSubmission,
            AppError::VersionConflict { .. } => ErrorCode::VersionConflict,
            AppError::AlreadyArchived { .. } => ErrorCode::AlreadyArchived,
            AppError::NotEditable { .. } => ErrorCode::NotEditable,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Notification { .. } => ErrorCode::NotificationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. }
            | AppError::MissingField { .. }
            | AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden { .. }
            | AppError::AdminRequired
            | AppError::AccountDisabled => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::NotFound { .. } | AppError::ProposalNotFound { .. } => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict (state machine refused the request)
            AppError::InvalidTransition { .. }
            | AppError::VersionConflict { .. }
            | AppError::AlreadyArchived { .. }
            | AppError::NotEditable { .. } => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            AppError::NotReady { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::Notification { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Additional structured details for the API response, if any
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::NotReady { missing } => Some(serde_json::json!({
                "missing_fields": missing,
            })),
            AppError::InvalidTransition { from, to } => Some(serde_json::json!({
                "from_status": from,
                "to_status": to,
            })),
            _ => None,
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let details = self.details();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details,
                request_id: None, // Filled by middleware
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Notification {
            message: err.to_string(),
        }
    }
}
