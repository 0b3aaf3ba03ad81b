use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::driver::DriverStatus;
use crate::services::credential_service::CredentialError;
use crate::services::store_service::StoreError;

/// Main error type for the road-radar service
#[derive(Debug)]
pub enum RadarError {
    // HTTP and API errors
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    InternalServer(String),

    // Storage errors
    StoreConnection(String),
    StoreQuery(String),
    StoreSerialization(String),

    // Credential errors
    CredentialHashing(String),

    // Business logic errors
    DriverNotFound(String),
    DuplicateDriver,
    InvalidCredentials,
    PendingApproval(DriverStatus),

    // Validation errors
    ValidationFailed(Vec<ValidationError>),
    InvalidFieldValue { field: String, value: String, reason: String },

    // Configuration and setup errors
    MissingEnvironmentVariable(String),
    InvalidConfiguration(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl fmt::Display for RadarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadarError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            RadarError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            RadarError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            RadarError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),

            RadarError::StoreConnection(msg) => write!(f, "Store connection error: {}", msg),
            RadarError::StoreQuery(msg) => write!(f, "Store query error: {}", msg),
            RadarError::StoreSerialization(msg) => write!(f, "Store serialization error: {}", msg),

            RadarError::CredentialHashing(msg) => write!(f, "Credential hashing error: {}", msg),

            RadarError::DriverNotFound(id) => write!(f, "Driver not found: {}", id),
            RadarError::DuplicateDriver => {
                write!(f, "Driver with this mobile number or vehicle number already exists")
            }
            RadarError::InvalidCredentials => write!(f, "Invalid credentials"),
            RadarError::PendingApproval(status) => {
                write!(f, "Your account is {}. Please wait for admin approval.", status)
            }

            RadarError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            RadarError::InvalidFieldValue { field, value, reason } => {
                write!(f, "Invalid value '{}' for field '{}': {}", value, field, reason)
            }

            RadarError::MissingEnvironmentVariable(var) => {
                write!(f, "Missing environment variable: {}", var)
            }
            RadarError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for RadarError {}

impl IntoResponse for RadarError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            RadarError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            RadarError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            // Uniqueness violations surface as 400, matching the registration contract.
            RadarError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg, None),

            RadarError::ValidationFailed(errors) => {
                let details = serde_json::to_value(&errors).ok();
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                let message = format!("Missing or invalid fields: {}", fields.join(", "));
                (StatusCode::BAD_REQUEST, "validation_failed", message, details)
            }
            RadarError::InvalidFieldValue { field, value: _, reason } => {
                (StatusCode::BAD_REQUEST, "invalid_field", format!("Invalid value for {}: {}", field, reason), None)
            }

            RadarError::DriverNotFound(_) => {
                (StatusCode::NOT_FOUND, "driver_not_found", "Driver not found".to_string(), None)
            }
            RadarError::DuplicateDriver => {
                let message = RadarError::DuplicateDriver.to_string();
                (StatusCode::BAD_REQUEST, "duplicate_driver", message, None)
            }
            RadarError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "invalid_credentials", "Invalid credentials".to_string(), None)
            }
            RadarError::PendingApproval(status) => {
                let message = RadarError::PendingApproval(status.clone()).to_string();
                let details = Some(serde_json::json!({ "status": status }));
                (StatusCode::FORBIDDEN, "pending_approval", message, details)
            }

            // All other errors are treated as internal server errors
            other => {
                tracing::error!(error = %other, "request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string(), None)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type RadarResult<T> = Result<T, RadarError>;

impl From<StoreError> for RadarError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { .. } => RadarError::DuplicateDriver,
            StoreError::Missing(id) => RadarError::DriverNotFound(id),
            StoreError::IdTaken(id) => RadarError::internal_error(format!("Driver id {} is already taken", id)),
            StoreError::Connection(msg) => RadarError::StoreConnection(msg),
            StoreError::Query(msg) => RadarError::StoreQuery(msg),
            StoreError::Serialization(msg) => RadarError::StoreSerialization(msg),
        }
    }
}

impl From<CredentialError> for RadarError {
    fn from(err: CredentialError) -> Self {
        RadarError::CredentialHashing(err.to_string())
    }
}

// Helper functions for creating common errors
impl RadarError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        RadarError::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        RadarError::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        RadarError::Conflict(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        RadarError::InternalServer(msg.into())
    }

    pub fn driver_not_found(driver_id: impl Into<String>) -> Self {
        RadarError::DriverNotFound(driver_id.into())
    }
}
