//! Authentication and authorization error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Authentication and authorization failures carry fixed, user-facing
//! messages (see [`messages`]). Upstream, configuration and internal causes
//! are logged server-side and replaced with a generic message for clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Fixed messages returned to clients.
pub mod messages {
    /// Missing or malformed bearer credential.
    pub const INVALID_TOKEN_ACCESS: &str = "invalid token access";

    /// Access token `exp` is in the past.
    pub const ACCESS_TOKEN_EXPIRED: &str = "access token expired";

    /// Refresh token `exp` is in the past.
    pub const REFRESH_TOKEN_EXPIRED: &str = "refresh token expired";

    /// Decoded token has no `sub` claim.
    pub const SUB_NOT_DEFINED: &str = "sub not defined";

    /// Token was revoked by a logout/disable action.
    pub const TOKEN_DEACTIVATED: &str = "token deactivated";

    /// Subject could not be resolved to a user.
    pub const INVALID_CREDENTIALS: &str = "invalid authentication credentials";

    /// Authenticated principal holds none of the required roles.
    pub const NO_PRIVILEGES: &str = "no privileges";

    /// Builds the `invalid token access: <cause>` message.
    pub fn invalid_token_access(cause: impl std::fmt::Display) -> String {
        format!("{INVALID_TOKEN_ACCESS}: {cause}")
    }
}

/// Authentication/authorization error.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - Forbidden: 403 Forbidden
/// - Configuration, Internal: 500 Internal Server Error
/// - Upstream: 502 Bad Gateway
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Shorthand for an `Unauthorized` error with a fixed message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AuthError::Unauthorized(message.into())
    }

    /// The `Forbidden("no privileges")` error raised on an empty role intersection.
    pub fn no_privileges() -> Self {
        AuthError::Forbidden(messages::NO_PRIVILEGES.to_string())
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Unauthorized(_) => 401,
            AuthError::Forbidden(_) => 403,
            AuthError::Configuration(_) | AuthError::Internal(_) => 500,
            AuthError::Upstream(_) => 502,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", reason.clone())
            }
            AuthError::Forbidden(reason) => (StatusCode::FORBIDDEN, "FORBIDDEN", reason.clone()),
            AuthError::Configuration(reason) => {
                tracing::error!(target: "jwt_auth.errors", reason = %reason, "Authentication is misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AuthError::Upstream(reason) => {
                tracing::warn!(target: "jwt_auth.errors", reason = %reason, "Upstream role service failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Role service unavailable".to_string(),
                )
            }
            AuthError::Internal(reason) => {
                tracing::error!(target: "jwt_auth.errors", reason = %reason, "Internal authentication error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer error=\"invalid_token\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
