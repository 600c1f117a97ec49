// src/error.rs

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Match request already sent")]
    DuplicateRequest,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Cannot {action} {entity} in state '{state}'")]
    InvalidTransition {
        entity: &'static str,
        action: &'static str,
        state: String,
    },

    #[error("Database error: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

// Front ends only ever see the message.
impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            AppError::not_found("Match", "m1").to_string(),
            "Match not found: m1"
        );
        let err = AppError::InvalidTransition {
            entity: "match",
            action: "start a session on",
            state: "pending".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot start a session on match in state 'pending'"
        );
    }

    #[test]
    fn serializes_as_message_string() {
        let json = serde_json::to_string(&AppError::DuplicateRequest).unwrap();
        assert_eq!(json, "\"Match request already sent\"");
    }
}
