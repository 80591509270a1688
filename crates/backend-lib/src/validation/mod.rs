// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Message validation module.
//!
//! Shape checks on decoded client messages. The engine runs them inside each
//! handler, after the sender is authorized and before anything is mutated.
//! Accepted values come back trimmed.

use thiserror::Error;

const MAX_USER_ID_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 64;
const MAX_CHAT_LENGTH: usize = 1000;
const MAX_QUESTION_LENGTH: usize = 500;

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("user id must be 1-{} characters", MAX_USER_ID_LENGTH)]
    InvalidUserId,

    #[error("name must be 1-{} characters", MAX_NAME_LENGTH)]
    InvalidName,

    #[error("chat message is empty")]
    EmptyChat,

    #[error("chat message exceeds {} characters", MAX_CHAT_LENGTH)]
    ChatTooLong,

    #[error("question must be 1-{} characters", MAX_QUESTION_LENGTH)]
    InvalidQuestion,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

fn within(text: &str, max: usize) -> bool {
    let len = text.trim().chars().count();
    len > 0 && len <= max
}

pub fn validate_user_id(id: &str) -> ValidationResult<&str> {
    if within(id, MAX_USER_ID_LENGTH) {
        Ok(id.trim())
    } else {
        Err(ValidationError::InvalidUserId)
    }
}

pub fn validate_name(name: &str) -> ValidationResult<&str> {
    if within(name, MAX_NAME_LENGTH) {
        Ok(name.trim())
    } else {
        Err(ValidationError::InvalidName)
    }
}

pub fn validate_chat_text(text: &str) -> ValidationResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyChat);
    }
    if trimmed.chars().count() > MAX_CHAT_LENGTH {
        return Err(ValidationError::ChatTooLong);
    }
    Ok(trimmed)
}

pub fn validate_question(question: &str) -> ValidationResult<&str> {
    if within(question, MAX_QUESTION_LENGTH) {
        Ok(question.trim())
    } else {
        Err(ValidationError::InvalidQuestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert_eq!(validate_user_id(" ana "), Ok("ana"));
        assert_eq!(validate_user_id("   "), Err(ValidationError::InvalidUserId));
        assert_eq!(
            validate_user_id(&"x".repeat(MAX_USER_ID_LENGTH + 1)),
            Err(ValidationError::InvalidUserId)
        );
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ana Lopez "), Ok("Ana Lopez"));
        assert_eq!(validate_name(""), Err(ValidationError::InvalidName));
    }

    #[test]
    fn test_validate_chat_text() {
        assert_eq!(validate_chat_text("  hola  "), Ok("hola"));
        assert_eq!(validate_chat_text(" \n "), Err(ValidationError::EmptyChat));
        assert_eq!(
            validate_chat_text(&"a".repeat(MAX_CHAT_LENGTH + 1)),
            Err(ValidationError::ChatTooLong)
        );
        // Limit counts characters, not bytes
        assert!(validate_chat_text(&"ñ".repeat(MAX_CHAT_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_question() {
        assert_eq!(validate_question(" Bill 42 "), Ok("Bill 42"));
        assert_eq!(validate_question(""), Err(ValidationError::InvalidQuestion));
    }
}
