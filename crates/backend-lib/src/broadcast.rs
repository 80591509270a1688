//! Broadcast coordinator: routes engine output to connections.
//!
//! Each connection owns an unbounded outbound queue drained by its socket
//! writer. Sends never wait; a queue whose writer has gone away is skipped.
use std::collections::HashMap;

use chamber_common::{ConnectionId, ServerToClient};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::metrics::{EVENT_ACCEPTED, EVENT_REJECTED};

pub type Outbound = mpsc::UnboundedSender<ServerToClient>;

#[derive(Debug, Default)]
pub struct Broadcaster {
    peers: HashMap<ConnectionId, Outbound>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, connection_id: ConnectionId, outbound: Outbound) {
        self.peers.insert(connection_id, outbound);
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) {
        self.peers.remove(connection_id);
    }

    pub fn send_to(&self, connection_id: &ConnectionId, message: ServerToClient) {
        match self.peers.get(connection_id) {
            Some(tx) => {
                if tx.send(message).is_err() {
                    debug!(%connection_id, "outbound queue closed");
                }
            },
            None => debug!(%connection_id, "no outbound queue for connection"),
        }
    }

    pub fn broadcast(&self, message: &ServerToClient) {
        for (connection_id, tx) in &self.peers {
            if tx.send(message.clone()).is_err() {
                debug!(%connection_id, "outbound queue closed");
            }
        }
    }

    pub fn broadcast_all(&self, messages: Vec<ServerToClient>) {
        for message in &messages {
            self.broadcast(message);
        }
    }

    /// Route the result of an engine event: accepted output goes to everyone,
    /// a rejection goes back to `origin` only.
    pub fn dispatch(&self, origin: &ConnectionId, result: Result<Vec<ServerToClient>, AppError>) {
        match result {
            Ok(messages) => {
                counter!(EVENT_ACCEPTED).increment(1);
                self.broadcast_all(messages);
            },
            Err(err) => {
                counter!(EVENT_REJECTED, "code" => err.error_code()).increment(1);
                warn!(connection_id = %origin, error = %err, "event rejected");
                self.send_to(origin, err.to_server_message());
            },
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
