//! Forest Error Types
//!
//! 라이브러리 전역 에러 타입과 호출자용 직렬화 가능한 에러

use serde::Serialize;
use thiserror::Error;

/// Forest 코어 에러
#[derive(Error, Debug)]
pub enum ForestError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Text entry not found: {0}")]
    TextEntryNotFound(i64),

    #[error("History entry {history_id} not found for text entry {text_entry_id}")]
    HistoryNotFound { text_entry_id: i64, history_id: i64 },

    #[error("Translation not found: text entry {text_entry_id}, language {language_code}")]
    TranslationNotFound {
        text_entry_id: i64,
        language_code: String,
    },

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("{kind} not found: {id}")]
    GlossaryNotFound { kind: &'static str, id: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl ForestError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ForestError::TextEntryNotFound(_)
                | ForestError::HistoryNotFound { .. }
                | ForestError::TranslationNotFound { .. }
                | ForestError::UserNotFound(_)
                | ForestError::GlossaryNotFound { .. }
        )
    }
}

/// UNIQUE 제약 위반을 Conflict로 변환 (저장소 진단 메시지는 노출하지 않음)
pub(crate) fn conflict_on_unique(error: rusqlite::Error, what: &str) -> ForestError {
    match &error {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ForestError::Conflict(format!("{what} already exists"))
        }
        _ => ForestError::Database(error),
    }
}

/// 명령 응답용 직렬화 가능한 에러
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl CommandError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        CommandError {
            code: "FORBIDDEN".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<ForestError> for CommandError {
    fn from(error: ForestError) -> Self {
        let code = match &error {
            ForestError::Database(_) => "DB_ERROR",
            ForestError::Io(_) => "IO_ERROR",
            ForestError::Serialization(_) => "SERIALIZATION_ERROR",
            ForestError::Forbidden(_) => "FORBIDDEN",
            e if e.is_not_found() => "NOT_FOUND",
            ForestError::Validation(_) => "VALIDATION_ERROR",
            ForestError::Conflict(_) => "CONFLICT",
            _ => "INVALID_OPERATION",
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

/// 명령 결과 타입
pub type CommandResult<T> = Result<T, CommandError>;
