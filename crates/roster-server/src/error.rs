use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use roster_core::error::RosterError;
use serde_json::json;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn user_not_found() -> Self {
        Self::not_found("User not found")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::Validation { field, message } => {
                Self::bad_request(format!("{field}: {message}"))
            }
            RosterError::DuplicateEmail
            | RosterError::DuplicateNickname
            | RosterError::AccountLocked
            | RosterError::InvalidOrExpiredToken => Self::bad_request(err.to_string()),
            RosterError::NotFound { .. } => Self::user_not_found(),
            RosterError::InvalidCredentials | RosterError::Unauthorized => {
                Self::unauthorized(err.to_string())
            }
            RosterError::Forbidden => Self::forbidden(err.to_string()),
            RosterError::ResourceExhausted(ref msg) => {
                tracing::error!(error = %msg, "create failed");
                Self::internal("Failed to create user")
            }
            RosterError::Database(ref msg) => {
                tracing::error!(error = %msg, "database operation failed");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Database operation failed")
            }
            RosterError::Crypto(ref msg) | RosterError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response = AppError::from(RosterError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (RosterError::DuplicateEmail, StatusCode::BAD_REQUEST),
            (RosterError::AccountLocked, StatusCode::BAD_REQUEST),
            (RosterError::validation("email", "bad"), StatusCode::BAD_REQUEST),
            (RosterError::user_not_found("x"), StatusCode::NOT_FOUND),
            (RosterError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (RosterError::Forbidden, StatusCode::FORBIDDEN),
            (
                RosterError::ResourceExhausted("nick".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RosterError::Database("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = AppError::from(RosterError::Crypto("bad salt length".into()));
        assert_eq!(err.message, "Internal server error");
    }
}
