//! Service error types with HTTP status code mapping.
//!
//! [`ProgressiaError`] is the central error type. Each variant maps to a
//! specific HTTP status code and structured JSON error response. Messages
//! are user-facing and written in Spanish.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "usuario no encontrado: 5b0e...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                  |
/// |-----------|------------------|------------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request              |
/// | 2000–2999 | Not Found/State  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server           | 500 Internal Server Error    |
/// | 4000–4999 | Rule violations  | 403 Forbidden / 422          |
#[derive(Debug, thiserror::Error)]
pub enum ProgressiaError {
    /// Request validation failed.
    #[error("solicitud inválida: {0}")]
    InvalidRequest(String),

    /// User with the given ID was not found.
    #[error("usuario no encontrado: {0}")]
    UserNotFound(uuid::Uuid),

    /// Lesson slug does not exist in the catalog.
    #[error("lección no encontrada: {0}")]
    LessonNotFound(String),

    /// Challenge with the given ID was not found.
    #[error("reto no encontrado: {0}")]
    ChallengeNotFound(uuid::Uuid),

    /// No pending friend request matches.
    #[error("solicitud de amistad no encontrada")]
    FriendshipNotFound,

    /// The operation collides with existing state.
    #[error("conflicto: {0}")]
    Conflict(String),

    /// The previous lesson has not been completed yet.
    #[error("la lección {0} está bloqueada; completa la anterior primero")]
    LessonLocked(String),

    /// The lesson requires a premium plan.
    #[error("la lección {0} requiere una suscripción premium")]
    PremiumRequired(String),

    /// Challenge invitees must be accepted friends.
    #[error("solo puedes retar a tus amigos: {0}")]
    NotFriends(uuid::Uuid),

    /// The challenge is already resolved.
    #[error("el reto {0} ya terminó")]
    ChallengeClosed(uuid::Uuid),

    /// Persistence layer failure.
    #[error("error de persistencia: {0}")]
    PersistenceError(String),

    /// Client exceeded rate limit.
    #[error("demasiadas solicitudes; intenta de nuevo en {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// Internal server error.
    #[error("error interno: {0}")]
    Internal(String),
}

impl ProgressiaError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UserNotFound(_) => 2001,
            Self::LessonNotFound(_) => 2002,
            Self::ChallengeNotFound(_) => 2003,
            Self::FriendshipNotFound => 2004,
            Self::Conflict(_) => 2009,
            Self::LessonLocked(_) => 4001,
            Self::PremiumRequired(_) => 4002,
            Self::NotFriends(_) => 4003,
            Self::ChallengeClosed(_) => 4004,
            Self::PersistenceError(_) => 3001,
            Self::RateLimited { .. } => 429,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_)
            | Self::LessonNotFound(_)
            | Self::ChallengeNotFound(_)
            | Self::FriendshipNotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::ChallengeClosed(_) => StatusCode::CONFLICT,
            Self::LessonLocked(_) | Self::NotFriends(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PremiumRequired(_) => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<sqlx::Error> for ProgressiaError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for ProgressiaError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for ProgressiaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            Self::RateLimited { retry_after_ms } => Some(format!("retry_after_ms={retry_after_ms}")),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_line_up() {
        let cases = [
            (ProgressiaError::InvalidRequest("x".into()), 1001, StatusCode::BAD_REQUEST),
            (ProgressiaError::UserNotFound(uuid::Uuid::nil()), 2001, StatusCode::NOT_FOUND),
            (ProgressiaError::Conflict("x".into()), 2009, StatusCode::CONFLICT),
            (ProgressiaError::PremiumRequired("x".into()), 4002, StatusCode::FORBIDDEN),
            (
                ProgressiaError::RateLimited { retry_after_ms: 5 },
                429,
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.error_code(), code);
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn into_response_sets_status() {
        let response = ProgressiaError::LessonLocked("tarjetas".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn messages_are_spanish() {
        let err = ProgressiaError::LessonNotFound("nope".into());
        assert_eq!(err.to_string(), "lección no encontrada: nope");
    }
}
