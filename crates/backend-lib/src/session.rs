//! Voting session state machine: `NoSession` <-> `Active`.
use chamber_common::{Role, Session, User};
use chrono::{DateTime, Utc};

use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    NoSession,
    Active {
        question: String,
        started_at: DateTime<Utc>,
    },
}

/// Authorization predicate for the session transitions
pub fn require_admin(user: Option<&User>) -> Result<&User, AppError> {
    match user {
        Some(user) if user.role == Role::Admin => Ok(user),
        _ => Err(AppError::Unauthorized),
    }
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    /// Open `question`, replacing any open one. Clearing votes is the
    /// caller's job since seats live elsewhere.
    pub fn open(&mut self, question: String) {
        *self = SessionState::Active {
            question,
            started_at: Utc::now(),
        };
    }

    pub fn close(&mut self) -> Result<(), AppError> {
        if !self.is_active() {
            return Err(AppError::SessionInactive);
        }
        *self = SessionState::NoSession;
        Ok(())
    }

    /// Wire form; `None` when no session is open
    pub fn to_wire(&self) -> Option<Session> {
        match self {
            SessionState::NoSession => None,
            SessionState::Active {
                question,
                started_at,
            } => Some(Session {
                question: question.clone(),
                is_active: true,
                started_at: *started_at,
            }),
        }
    }
}
