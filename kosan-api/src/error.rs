/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Errors render as JSON:
///
/// ```json
/// { "error": "Human readable message", "code": "bad_request" }
/// ```
///
/// with optional `details` (per-field validation messages) and
/// `validExamples` (accepted phone number formats).
///
/// # Example
///
/// ```
/// use kosan_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(id: Option<u32>) -> ApiResult<Json<Value>> {
///     let id = id.ok_or_else(|| ApiError::BadRequest("id is required".to_string()))?;
///     Ok(Json(json!({ "id": id })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kosan_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};
use kosan_shared::models::{pending_payment, user};
use kosan_shared::phone::PhoneError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::payment::PaymentError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Field validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Phone number rejected (400), carries accepted formats
    InvalidPhone {
        message: String,
        valid_examples: Vec<String>,
    },

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Internal server error (500), detail is logged and never returned
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,

    /// Machine-readable code (e.g. "bad_request")
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_examples: Option<Vec<String>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InvalidPhone { message, .. } => write!(f, "Invalid phone: {}", message),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::ValidationError(_)
            | ApiError::InvalidPhone { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::BadRequest(msg) => ErrorResponse::new(msg, "bad_request"),
            ApiError::ValidationError(errors) => {
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request validation failed".to_string());
                ErrorResponse {
                    details: Some(errors),
                    ..ErrorResponse::new(message, "validation_error")
                }
            }
            ApiError::InvalidPhone {
                message,
                valid_examples,
            } => ErrorResponse {
                valid_examples: Some(valid_examples),
                ..ErrorResponse::new(message, "invalid_phone")
            },
            ApiError::Unauthorized(msg) => ErrorResponse::new(msg, "unauthorized"),
            ApiError::Forbidden(msg) => ErrorResponse::new(msg, "forbidden"),
            ApiError::NotFound(msg) => ErrorResponse::new(msg, "not_found"),
            ApiError::Conflict(msg) => ErrorResponse::new(msg, "conflict"),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ErrorResponse::new("An internal error occurred".to_string(), "internal_error")
            }
        };

        (status, Json(body)).into_response()
    }
}

impl ErrorResponse {
    fn new(error: String, code: &str) -> Self {
        Self {
            error,
            code: code.to_string(),
            details: None,
            valid_examples: None,
        }
    }
}

/// Message for an email that is already a user or awaiting payment
pub const EMAIL_TAKEN: &str = "Email already registered or awaiting payment";

/// Message for a number that is already a user or awaiting payment
pub const WHATSAPP_TAKEN: &str = "WhatsApp number already registered or awaiting payment";

/// Convert sqlx errors to API errors
///
/// Unique violations on the registration tables surface as the same 400 the
/// explicit duplicate checks return, so a lost race looks like an ordinary
/// duplicate to the client.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some(user::EMAIL_UNIQUE_CONSTRAINT)
                | Some(pending_payment::EMAIL_UNIQUE_CONSTRAINT) => {
                    ApiError::BadRequest(EMAIL_TAKEN.to_string())
                }
                Some(user::WHATSAPP_UNIQUE_CONSTRAINT) => {
                    ApiError::Conflict("WhatsApp number is already in use".to_string())
                }
                Some(constraint) => {
                    ApiError::Conflict(format!("Constraint violation: {}", constraint))
                }
                None => ApiError::InternalError(format!("Database error: {}", db_err)),
            },
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotOwner => {
                ApiError::Forbidden("You do not have access to this kosan".to_string())
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<PhoneError> for ApiError {
    fn from(err: PhoneError) -> Self {
        ApiError::InvalidPhone {
            message: err.to_string(),
            valid_examples: err.valid_examples(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::InternalError(format!("Payment gateway error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}
