// ============================
// chamber-backend-lib/src/engine.rs
// ============================
//! Chamber state engine.
//!
//! `Engine` owns the whole chamber state (connections, users, seats, session,
//! chat) and applies one event at a time. Every event is validated before
//! anything is mutated, so a rejected event leaves the state exactly as it
//! was. Accepted events return the messages every connection must receive;
//! routing them is the broadcaster's job.
use std::collections::HashSet;

use chamber_common::{
    ChatMessage, ClientToServer, ConnectionId, Role, SeatNumber, ServerToClient, User, Vote,
    GUEST_AUTHOR,
};
use chrono::Utc;
use metrics::counter;
use tracing::{debug, info};

use crate::chat::ChatLog;
use crate::error::AppError;
use crate::metrics::{CHAT_MESSAGES, VOTES_CAST};
use crate::registry::ConnectionRegistry;
use crate::seats::SeatTable;
use crate::session::{require_admin, SessionState};
use crate::validation;

/// Messages to send to every connection after an accepted event
pub type Broadcasts = Vec<ServerToClient>;

#[derive(Debug)]
pub struct Engine {
    connections: HashSet<ConnectionId>,
    registry: ConnectionRegistry,
    seats: SeatTable,
    session: SessionState,
    chat: ChatLog,
}

impl Engine {
    pub fn new(seat_count: u32, chat_capacity: usize) -> Self {
        Self {
            connections: HashSet::new(),
            registry: ConnectionRegistry::new(),
            seats: SeatTable::new(seat_count),
            session: SessionState::default(),
            chat: ChatLog::with_capacity(chat_capacity),
        }
    }

    /// Open a transport connection.
    ///
    /// Returns the snapshot taken before the connection is counted, to be sent
    /// to that connection only, and the broadcasts for everyone.
    pub fn connect(&mut self, connection_id: ConnectionId) -> (ServerToClient, Broadcasts) {
        let snapshot = self.snapshot();
        if !self.connections.insert(connection_id) {
            return (snapshot, Vec::new());
        }
        info!(%connection_id, online = self.online_count(), "connection opened");
        (snapshot, vec![self.online_count_message()])
    }

    /// Close a transport connection. Safe to call more than once.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Broadcasts {
        if !self.connections.remove(&connection_id) {
            return Vec::new();
        }

        let mut out = Vec::new();
        if let Ok(user) = self.registry.remove(&connection_id) {
            let seat = self.seats.vacate_by_user(&user.id);
            info!(%connection_id, user_id = %user.id, ?seat, "user left");
            out.push(ServerToClient::UserLeft { user_id: user.id });
            out.push(self.state_update());
        } else {
            info!(%connection_id, "connection closed before joining");
        }
        out.push(self.online_count_message());
        out
    }

    /// Apply one client event from `connection_id`
    pub fn apply(
        &mut self,
        connection_id: ConnectionId,
        event: ClientToServer,
    ) -> Result<Broadcasts, AppError> {
        if !self.connections.contains(&connection_id) {
            return Err(AppError::NotFound(connection_id));
        }

        match event {
            ClientToServer::Join {
                id,
                name,
                role,
                seat_number,
            } => self.join(connection_id, id, name, role, seat_number),
            ClientToServer::Vote { seat_number, vote } => {
                self.vote(connection_id, seat_number, vote)
            },
            ClientToServer::Chat { text } => self.post_chat(connection_id, &text),
            ClientToServer::StartSession { question } => {
                self.start_session(connection_id, &question)
            },
            ClientToServer::ResetVotes => self.reset_votes(connection_id),
            ClientToServer::EndSession => self.end_session(connection_id),
        }
    }

    fn join(
        &mut self,
        connection_id: ConnectionId,
        id: String,
        name: String,
        role: Role,
        seat_number: Option<SeatNumber>,
    ) -> Result<Broadcasts, AppError> {
        if self.registry.is_registered(&connection_id) {
            return Err(AppError::DuplicateConnection(connection_id));
        }
        let id = validation::validate_user_id(&id)?;
        let name = validation::validate_name(&name)?;
        if self.registry.lookup_user(id).is_some() {
            return Err(AppError::UserAlreadyConnected(id.to_string()));
        }

        let user = User {
            id: id.to_string(),
            name: name.to_string(),
            role,
            connection_id,
        };
        // Only deputies sit; a seat number from anyone else is ignored
        let seat = seat_number.filter(|_| role == Role::Deputy);
        if let Some(number) = seat {
            self.seats.check_assign(number, &user)?;
        }

        self.registry.register(connection_id, user.clone())?;
        if let Some(number) = seat {
            self.seats.assign(number, &user)?;
        }

        info!(%connection_id, user_id = %user.id, ?role, ?seat, "user joined");
        Ok(vec![ServerToClient::UserJoined { user }, self.state_update()])
    }

    fn vote(
        &mut self,
        connection_id: ConnectionId,
        seat_number: SeatNumber,
        vote: Vote,
    ) -> Result<Broadcasts, AppError> {
        let user = self.registry.lookup(&connection_id)?;
        self.seats.set_vote(seat_number, vote, user, &self.session)?;
        counter!(VOTES_CAST).increment(1);
        debug!(user_id = %user.id, seat = seat_number, ?vote, "vote recorded");
        Ok(vec![self.state_update()])
    }

    fn post_chat(&mut self, connection_id: ConnectionId, text: &str) -> Result<Broadcasts, AppError> {
        let text = validation::validate_chat_text(text)?;
        let author = self
            .registry
            .lookup(&connection_id)
            .map(|user| user.name.clone())
            .unwrap_or_else(|_| GUEST_AUTHOR.to_string());

        let message = ChatMessage {
            author,
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        self.chat.append(message.clone());
        counter!(CHAT_MESSAGES).increment(1);
        debug!(author = %message.author, "chat message");
        Ok(vec![ServerToClient::ChatMessage { message }])
    }

    fn start_session(
        &mut self,
        connection_id: ConnectionId,
        question: &str,
    ) -> Result<Broadcasts, AppError> {
        require_admin(self.registry.lookup(&connection_id).ok())?;
        let question = validation::validate_question(question)?;

        self.session.open(question.to_string());
        self.seats.reset_votes();
        info!(question, "session started");
        Ok(vec![self.state_update()])
    }

    fn reset_votes(&mut self, connection_id: ConnectionId) -> Result<Broadcasts, AppError> {
        require_admin(self.registry.lookup(&connection_id).ok())?;
        self.seats.reset_votes();
        info!("votes reset");
        Ok(vec![self.state_update()])
    }

    fn end_session(&mut self, connection_id: ConnectionId) -> Result<Broadcasts, AppError> {
        require_admin(self.registry.lookup(&connection_id).ok())?;
        self.session.close()?;
        info!("session ended");
        Ok(vec![self.state_update()])
    }

    /// Full state, as sent to a newly opened connection
    pub fn snapshot(&self) -> ServerToClient {
        ServerToClient::Snapshot {
            users: self.registry.users(),
            seats: self.seats.seats().to_vec(),
            session: self.session.to_wire(),
            chat: self.chat.messages(),
            online_count: self.online_count(),
            tally: self.seats.tally(),
        }
    }

    pub fn state_update(&self) -> ServerToClient {
        ServerToClient::StateUpdate {
            seats: self.seats.seats().to_vec(),
            session: self.session.to_wire(),
            online_count: self.online_count(),
            tally: self.seats.tally(),
        }
    }

    fn online_count_message(&self) -> ServerToClient {
        ServerToClient::OnlineCount {
            count: self.online_count(),
        }
    }

    pub fn online_count(&self) -> usize {
        self.connections.len()
    }

    pub fn seats(&self) -> &SeatTable {
        &self.seats
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}
