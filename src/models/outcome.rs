use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Category of a definitive negative answer
///
/// Travels on the wire as the optional `code` field next to `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing required field, password under minimum length
    Validation,
    /// Email or username already registered
    Conflict,
    /// No matching user or plan
    NotFound,
    /// Stored credential does not match
    InvalidCredential,
    /// Caller does not own the resource
    Forbidden,
    /// Local storage rejected a write
    StorageUnavailable,
    Internal,
}

impl ErrorKind {
    /// Best-effort classification for failures that arrive without a `code`
    pub fn from_message(message: &str) -> Self {
        match message {
            MSG_USER_EXISTS | MSG_ALREADY_SHARED => ErrorKind::Conflict,
            MSG_USER_NOT_FOUND | MSG_PLAN_NOT_FOUND | MSG_SHARE_TARGET_NOT_FOUND => {
                ErrorKind::NotFound
            }
            MSG_INVALID_PASSWORD => ErrorKind::InvalidCredential,
            MSG_NOT_PLAN_OWNER => ErrorKind::Forbidden,
            MSG_INTERNAL => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }
}

/// Failure variant of every sync operation
///
/// `message` is meant to be rendered to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Rebuild a failure from a `{success: false, message, code?}` body
    pub fn from_wire(message: Option<String>, code: Option<ErrorKind>) -> Self {
        let message = message.unwrap_or_else(|| MSG_INTERNAL.to_string());
        let kind = code.unwrap_or_else(|| ErrorKind::from_message(&message));
        Self { kind, message }
    }
}

/// Tagged result of a sync operation: typed payload or classified failure
pub type Outcome<T> = std::result::Result<T, Failure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_inferred_from_known_messages() {
        assert_eq!(ErrorKind::from_message(MSG_USER_EXISTS), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_message(MSG_USER_NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(
            ErrorKind::from_message(MSG_INVALID_PASSWORD),
            ErrorKind::InvalidCredential
        );
        assert_eq!(ErrorKind::from_message(MSG_WEAK_PASSWORD), ErrorKind::Validation);
    }

    #[test]
    fn test_explicit_code_wins_over_message() {
        let failure = Failure::from_wire(
            Some("Quota exceeded".to_string()),
            Some(ErrorKind::StorageUnavailable),
        );
        assert_eq!(failure.kind, ErrorKind::StorageUnavailable);
        assert_eq!(failure.to_string(), "Quota exceeded");
    }

    #[test]
    fn test_code_wire_format() {
        let json = serde_json::to_string(&ErrorKind::InvalidCredential).unwrap();
        assert_eq!(json, "\"INVALID_CREDENTIAL\"");
    }
}
