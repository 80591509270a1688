//! Connection registry: which user joined on which connection.
use std::collections::HashMap;

use chamber_common::{ConnectionId, User};

use crate::error::AppError;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: HashMap<ConnectionId, User>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `user` to `connection_id`. A connection joins at most once.
    pub fn register(&mut self, connection_id: ConnectionId, user: User) -> Result<(), AppError> {
        if self.users.contains_key(&connection_id) {
            return Err(AppError::DuplicateConnection(connection_id));
        }
        self.users.insert(connection_id, user);
        Ok(())
    }

    pub fn lookup(&self, connection_id: &ConnectionId) -> Result<&User, AppError> {
        self.users
            .get(connection_id)
            .ok_or(AppError::NotFound(*connection_id))
    }

    /// Connection currently holding `user_id`, if any
    pub fn lookup_user(&self, user_id: &str) -> Option<ConnectionId> {
        self.users
            .iter()
            .find(|(_, user)| user.id == user_id)
            .map(|(conn, _)| *conn)
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Result<User, AppError> {
        self.users
            .remove(connection_id)
            .ok_or(AppError::NotFound(*connection_id))
    }

    pub fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.users.contains_key(connection_id)
    }

    /// Users ordered by id, so snapshots are deterministic
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
