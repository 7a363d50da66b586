use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::*;
use crate::models::{ErrorKind, Failure};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Password must be at least 8 characters")]
    WeakPassword,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Plan not found")]
    PlanNotFound,

    #[error("You do not own this plan")]
    NotPlanOwner,

    #[error("User with this email not found")]
    ShareTargetNotFound,

    #[error("Plan already shared with this user")]
    AlreadyShared,

    #[error("Local storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AppError {
    /// Business classification, `None` for infrastructure faults
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Io(_) | AppError::Json(_) | AppError::TaskJoin(_) => None,
            AppError::MissingFields(_) | AppError::WeakPassword => Some(ErrorKind::Validation),
            AppError::UserAlreadyExists | AppError::AlreadyShared => Some(ErrorKind::Conflict),
            AppError::UserNotFound | AppError::PlanNotFound | AppError::ShareTargetNotFound => {
                Some(ErrorKind::NotFound)
            }
            AppError::InvalidPassword => Some(ErrorKind::InvalidCredential),
            AppError::NotPlanOwner => Some(ErrorKind::Forbidden),
            AppError::StorageUnavailable(_) => Some(ErrorKind::StorageUnavailable),
        }
    }
}

impl From<AppError> for Failure {
    fn from(err: AppError) -> Self {
        match err.kind() {
            Some(kind) => Failure::new(kind, err.to_string()),
            None => {
                tracing::error!("Unexpected failure: {:?}", err);
                Failure::new(ErrorKind::Internal, MSG_INTERNAL)
            }
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
///
/// Business rejections are answered with 200 and `success: false`; only
/// infrastructure faults produce a non-2xx status, which clients read as
/// "backend could not be consulted".
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Some(kind) = self.kind() else {
            tracing::error!("Internal error: {:?}", self);
            let body = Json(json!({
                "success": false,
                "message": MSG_INTERNAL,
                "code": ErrorKind::Internal,
            }));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
            "code": kind,
        }));

        (StatusCode::OK, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_keep_user_facing_message() {
        let failure: Failure = AppError::UserAlreadyExists.into();
        assert_eq!(failure.kind, ErrorKind::Conflict);
        assert_eq!(failure.message, "User already exists");

        let failure: Failure = AppError::MissingFields(MSG_ALL_FIELDS_REQUIRED).into();
        assert_eq!(failure.kind, ErrorKind::Validation);
        assert_eq!(failure.message, "All fields are required");
    }

    #[test]
    fn test_infrastructure_errors_are_masked() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let failure: Failure = AppError::Io(io).into();
        assert_eq!(failure.kind, ErrorKind::Internal);
        assert_eq!(failure.message, MSG_INTERNAL);
    }

    #[test]
    fn test_business_error_is_http_ok() {
        let response = AppError::InvalidPassword.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let response = AppError::Io(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
