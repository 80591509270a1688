// ============================
// chamber-backend-lib/src/chamber_actor.rs
// ============================
use chamber_common::{ClientToServer, ConnectionId, ServerToClient};
use metrics::gauge;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use crate::broadcast::{Broadcaster, Outbound};
use crate::engine::Engine;
use crate::error::AppError;
use crate::metrics::USERS_JOINED;

/// Message sent *into* the actor
#[derive(Debug)]
pub enum ActorMsg {
    Connect {
        connection_id: ConnectionId,
        outbound: Outbound,
    },
    Event {
        connection_id: ConnectionId,
        event: ClientToServer,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    Snapshot {
        resp_tx: oneshot::Sender<ServerToClient>,
    },
}

/// Handle that other components keep: the actor's command channel.
///
/// Commands are processed strictly in the order they are sent, so events
/// from one connection are applied in arrival order and a disconnect is
/// never overtaken by an earlier event of the same connection.
#[derive(Clone, Debug)]
pub struct ChamberHandle {
    cmd_tx: mpsc::UnboundedSender<ActorMsg>,
}

impl ChamberHandle {
    /// Register a new connection. The returned receiver yields the snapshot
    /// first, then every broadcast from this point on.
    pub fn connect(
        &self,
    ) -> Result<(ConnectionId, mpsc::UnboundedReceiver<ServerToClient>), AppError> {
        let connection_id = Uuid::new_v4();
        let (outbound, rx) = mpsc::unbounded_channel();
        self.cmd_tx.send(ActorMsg::Connect {
            connection_id,
            outbound,
        })?;
        Ok((connection_id, rx))
    }

    /// Queue an event; the outcome arrives on the connection's receiver
    pub fn send_event(
        &self,
        connection_id: ConnectionId,
        event: ClientToServer,
    ) -> Result<(), AppError> {
        self.cmd_tx.send(ActorMsg::Event {
            connection_id,
            event,
        })?;
        Ok(())
    }

    pub fn disconnect(&self, connection_id: ConnectionId) -> Result<(), AppError> {
        self.cmd_tx.send(ActorMsg::Disconnect { connection_id })?;
        Ok(())
    }

    /// Current full state
    pub async fn snapshot(&self) -> Result<ServerToClient, AppError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.cmd_tx.send(ActorMsg::Snapshot { resp_tx })?;
        Ok(resp_rx.await?)
    }
}

/// Single owner of the chamber state and of every outbound queue
pub struct ChamberActor {
    engine: Engine,
    peers: Broadcaster,
}

impl ChamberActor {
    pub fn new(seat_count: u32, chat_capacity: usize) -> Self {
        ChamberActor {
            engine: Engine::new(seat_count, chat_capacity),
            peers: Broadcaster::new(),
        }
    }

    /// Apply one command to completion, including every send it causes
    pub fn handle(&mut self, msg: ActorMsg) {
        match msg {
            ActorMsg::Connect {
                connection_id,
                outbound,
            } => {
                let (snapshot, broadcasts) = self.engine.connect(connection_id);
                self.peers.add(connection_id, outbound);
                self.peers.send_to(&connection_id, snapshot);
                self.peers.broadcast_all(broadcasts);
            },
            ActorMsg::Event {
                connection_id,
                event,
            } => {
                let result = self.engine.apply(connection_id, event);
                self.peers.dispatch(&connection_id, result);
            },
            ActorMsg::Disconnect { connection_id } => {
                self.peers.remove(&connection_id);
                let broadcasts = self.engine.disconnect(connection_id);
                self.peers.broadcast_all(broadcasts);
            },
            ActorMsg::Snapshot { resp_tx } => {
                let _ = resp_tx.send(self.engine.snapshot());
            },
        }
        gauge!(USERS_JOINED).set(self.engine.registry().len() as f64);
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ActorMsg>) {
        info!(seats = self.engine.seats().len(), "chamber actor started");
        while let Some(msg) = rx.recv().await {
            self.handle(msg);
        }
        debug!("chamber actor stopped: all handles dropped");
    }
}

/// Spawn a new chamber actor and return its handle
pub fn spawn_chamber_actor(seat_count: u32, chat_capacity: usize) -> ChamberHandle {
    let (cmd_tx, rx_cmd) = mpsc::unbounded_channel();
    let actor = ChamberActor::new(seat_count, chat_capacity);

    tokio::spawn(async move {
        actor.run(rx_cmd).await;
    });

    ChamberHandle { cmd_tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chamber_common::{Role, Vote};

    fn connect(actor: &mut ChamberActor) -> (ConnectionId, mpsc::UnboundedReceiver<ServerToClient>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();
        actor.handle(ActorMsg::Connect {
            connection_id,
            outbound,
        });
        (connection_id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerToClient>) -> Vec<ServerToClient> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_connect_delivers_snapshot_then_count() {
        let mut actor = ChamberActor::new(10, 100);
        let (_, mut rx1) = connect(&mut actor);
        let first = drain(&mut rx1);
        assert!(matches!(first[0], ServerToClient::Snapshot { online_count: 0, .. }));
        assert_eq!(first[1], ServerToClient::OnlineCount { count: 1 });

        let (_, mut rx2) = connect(&mut actor);
        assert_eq!(drain(&mut rx1), vec![ServerToClient::OnlineCount { count: 2 }]);
        let second = drain(&mut rx2);
        assert!(matches!(second[0], ServerToClient::Snapshot { online_count: 1, .. }));
        assert_eq!(second[1], ServerToClient::OnlineCount { count: 2 });
    }

    #[test]
    fn test_disconnect_then_stale_vote() {
        let mut actor = ChamberActor::new(10, 100);
        let (chair, mut chair_rx) = connect(&mut actor);
        let (ana, _ana_rx) = connect(&mut actor);
        for (conn, id, role, seat) in [(chair, "chair", Role::Admin, None), (ana, "ana", Role::Deputy, Some(4))] {
            actor.handle(ActorMsg::Event {
                connection_id: conn,
                event: ClientToServer::Join {
                    id: id.to_string(),
                    name: id.to_string(),
                    role,
                    seat_number: seat,
                },
            });
        }
        actor.handle(ActorMsg::Event {
            connection_id: chair,
            event: ClientToServer::StartSession {
                question: "Bill 42".to_string(),
            },
        });
        drain(&mut chair_rx);

        // disconnect queued ahead of a vote that was already in flight
        actor.handle(ActorMsg::Disconnect { connection_id: ana });
        actor.handle(ActorMsg::Event {
            connection_id: ana,
            event: ClientToServer::Vote {
                seat_number: 4,
                vote: Vote::Favor,
            },
        });

        assert!(actor.engine().seats().get(4).unwrap().is_vacant());
        let seen = drain(&mut chair_rx);
        assert_eq!(seen[0], ServerToClient::UserLeft { user_id: "ana".to_string() });
        assert!(seen.iter().all(|m| !matches!(m, ServerToClient::Error { .. })));
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let handle = spawn_chamber_actor(5, 10);
        let (conn, mut rx) = handle.connect().unwrap();
        assert!(matches!(rx.recv().await, Some(ServerToClient::Snapshot { .. })));
        assert_eq!(rx.recv().await, Some(ServerToClient::OnlineCount { count: 1 }));

        handle
            .send_event(conn, ClientToServer::Chat { text: "hola".to_string() })
            .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(ServerToClient::ChatMessage { message }) if message.text == "hola"
        ));

        let ServerToClient::Snapshot { chat, seats, .. } = handle.snapshot().await.unwrap() else {
            panic!("expected snapshot");
        };
        assert_eq!(chat.len(), 1);
        assert_eq!(seats.len(), 5);
    }
}
