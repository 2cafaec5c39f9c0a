// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation {
        message: String,
        missing_fields: Vec<&'static str>,
    },
    InvalidField {
        field: &'static str,
        message: String,
    },
    // Duplicate short name. Reported as 400 on the wire; the body carries
    // the conflicting field so clients can distinguish it from a plain
    // validation failure.
    Conflict {
        message: String,
        field: &'static str,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found (also covers ownership mismatches, which must be
    // indistinguishable from nonexistence)
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (identity service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Validation { .. } => 400,
            ApiError::InvalidField { .. } => 400,
            ApiError::Conflict { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Validation { message, .. } => message,
            ApiError::InvalidField { message, .. } => message,
            ApiError::Conflict { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation {
                message,
                missing_fields,
            } => {
                let mut response = json!({ "error": message });
                if !missing_fields.is_empty() {
                    response["missingFields"] = json!(missing_fields);
                }
                response
            }
            ApiError::InvalidField { field, message } => {
                json!({ "error": message, "field": field })
            }
            ApiError::Conflict { message, field } => {
                json!({ "error": message, "field": field })
            }
            _ => json!({ "error": self.message() }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>, missing_fields: Vec<&'static str>) -> Self {
        ApiError::Validation {
            message: message.into(),
            missing_fields,
        }
    }

    pub fn conflict(message: impl Into<String>, field: &'static str) -> Self {
        ApiError::Conflict {
            message: message.into(),
            field,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::models::question::QuestionError> for ApiError {
    fn from(err: crate::database::models::question::QuestionError) -> Self {
        use crate::database::models::question::QuestionError;
        match err {
            QuestionError::MissingFields(fields) => {
                ApiError::validation("Missing required fields", fields)
            }
            QuestionError::InvalidField { field, reason } => ApiError::InvalidField {
                field,
                message: reason,
            },
            QuestionError::DuplicateShortName => ApiError::conflict(
                "Question with this short name already exists",
                "shortName",
            ),
            QuestionError::NotFound => ApiError::not_found("Question not found"),
            QuestionError::Storage(msg) => {
                tracing::error!("Question storage error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            QuestionError::Database(sqlx_err) => {
                // Log the real error but return a generic message
                tracing::error!("Question database error: {}", sqlx_err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::services::profile_service::ProfileError> for ApiError {
    fn from(err: crate::services::profile_service::ProfileError) -> Self {
        use crate::services::profile_service::ProfileError;
        match err {
            ProfileError::Database(sqlx_err) => {
                tracing::error!("Profile database error: {}", sqlx_err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::identity::IdentityError> for ApiError {
    fn from(err: crate::identity::IdentityError) -> Self {
        use crate::identity::IdentityError;
        match err {
            IdentityError::InvalidToken(msg) => {
                ApiError::unauthorized(format!("Unauthorized - {}", msg))
            }
            IdentityError::UserNotFound(uid) => {
                tracing::warn!("Identity lookup for unknown user: {}", uid);
                ApiError::not_found("User not found")
            }
            IdentityError::Upstream(msg) => {
                tracing::error!("Identity service error: {}", msg);
                ApiError::bad_gateway("Identity service unavailable")
            }
            IdentityError::Transport(e) => {
                tracing::error!("Identity service transport error: {}", e);
                ApiError::bad_gateway("Identity service unavailable")
            }
        }
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        use crate::database::manager::DatabaseError;
        match err {
            DatabaseError::ConfigMissing(name) => {
                tracing::error!("Missing database configuration: {}", name);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("Database error: {}", sqlx_err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        assert_eq!(ApiError::validation("x", vec![]).status_code(), 400);
        assert_eq!(ApiError::conflict("x", "shortName").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::internal_server_error("x").status_code(), 500);
        assert_eq!(ApiError::bad_gateway("x").status_code(), 502);
    }

    #[test]
    fn validation_body_enumerates_missing_fields() {
        let err = ApiError::validation("Missing required fields", vec!["class", "prompt"]);
        let body = err.to_json();
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(body["missingFields"], json!(["class", "prompt"]));
    }

    #[test]
    fn conflict_body_names_the_field() {
        let err = ApiError::conflict("Question with this short name already exists", "shortName");
        let body = err.to_json();
        assert_eq!(body["field"], "shortName");
    }

    #[test]
    fn plain_errors_carry_only_a_message() {
        let body = ApiError::not_found("Question not found").to_json();
        assert_eq!(body, json!({ "error": "Question not found" }));
    }
}
