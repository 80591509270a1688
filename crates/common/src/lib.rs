// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the chamber client and server.
//! This module defines the WebSocket protocol messages and the shared
//! data model (users, seats, session, chat) they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier the server assigns to each live transport connection
pub type ConnectionId = Uuid;

/// Seat numbers start at 1
pub type SeatNumber = u32;

/// Number of seats in the chamber unless configured otherwise
pub const DEFAULT_SEAT_COUNT: u32 = 60;

/// Number of chat messages kept unless configured otherwise
pub const DEFAULT_CHAT_CAPACITY: usize = 100;

/// Author recorded for chat messages sent before a `join`
pub const GUEST_AUTHOR: &str = "guest";

/// Role a user claims when joining
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Voting participant, occupies one seat
    Deputy,
    /// Opens, resets and closes voting sessions
    Admin,
    /// Read-only viewer
    Guest,
}

/// A deputy's position on the open question
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Favor,
    Against,
    Abstain,
}

/// A user bound to a live connection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub connection_id: ConnectionId,
}

/// A numbered seat; vacant iff `occupant_user_id` is `None`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub number: SeatNumber,
    pub occupant_user_id: Option<String>,
    pub occupant_name: Option<String>,
    pub vote: Option<Vote>,
}

impl Seat {
    pub fn vacant(number: SeatNumber) -> Self {
        Self {
            number,
            occupant_user_id: None,
            occupant_name: None,
            vote: None,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.occupant_user_id.is_none()
    }

    pub fn is_occupied_by(&self, user_id: &str) -> bool {
        self.occupant_user_id.as_deref() == Some(user_id)
    }
}

/// The open voting question
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub question: String,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
}

/// A single chat line
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Vote counts over the occupied seats
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub favor: u32,
    pub against: u32,
    pub abstain: u32,
    /// Occupied seats that have not voted yet
    pub pending: u32,
}

/// Messages sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientToServer {
    /// Bind a user identity to this connection
    /// # Fields
    /// * `id` - Client-chosen user id, unique among live users
    /// * `name` - Display name
    /// * `role` - Claimed role, taken as given
    /// * `seat_number` - Seat to occupy; only honoured for deputies
    Join {
        id: String,
        name: String,
        role: Role,
        #[serde(default)]
        seat_number: Option<SeatNumber>,
    },
    /// Cast or replace the vote of the caller's seat
    Vote { seat_number: SeatNumber, vote: Vote },
    /// Append a line to the chat log
    Chat { text: String },
    /// Open (or replace) the voting question; admin only
    StartSession { question: String },
    /// Clear every seat's vote; admin only
    ResetVotes,
    /// Close the voting question; admin only
    EndSession,
}

/// Messages sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerToClient {
    /// Full state, sent once to a newly opened connection
    Snapshot {
        users: Vec<User>,
        seats: Vec<Seat>,
        session: Option<Session>,
        chat: Vec<ChatMessage>,
        online_count: usize,
        tally: Tally,
    },
    /// Seats and session after an accepted mutation, sent to everyone
    StateUpdate {
        seats: Vec<Seat>,
        session: Option<Session>,
        online_count: usize,
        tally: Tally,
    },
    /// A newly appended chat line
    ChatMessage { message: ChatMessage },
    UserJoined { user: User },
    UserLeft { user_id: String },
    OnlineCount {
        #[serde(rename = "n")]
        count: usize,
    },
    /// Rejection of the sender's last event
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_deserialization() {
        let json = r#"{"type":"join","id":"u1","name":"Ana","role":"deputy","seatNumber":12}"#;
        let msg: ClientToServer = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientToServer::Join {
                id: "u1".to_string(),
                name: "Ana".to_string(),
                role: Role::Deputy,
                seat_number: Some(12),
            }
        );

        // seatNumber is optional
        let json = r#"{"type":"join","id":"a1","name":"Chair","role":"admin"}"#;
        let msg: ClientToServer = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientToServer::Join { seat_number: None, .. }));
    }

    #[test]
    fn test_fieldless_events() {
        let msg: ClientToServer = serde_json::from_str(r#"{"type":"reset_votes"}"#).unwrap();
        assert_eq!(msg, ClientToServer::ResetVotes);

        let msg: ClientToServer = serde_json::from_str(r#"{"type":"end_session"}"#).unwrap();
        assert_eq!(msg, ClientToServer::EndSession);
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        assert!(serde_json::from_str::<ClientToServer>(r#"{"type":"dance"}"#).is_err());
        assert!(serde_json::from_str::<ClientToServer>(r#"{"type":"vote","seatNumber":1,"vote":"maybe"}"#).is_err());
    }

    #[test]
    fn test_server_message_shape() {
        let update = ServerToClient::StateUpdate {
            seats: vec![Seat::vacant(1)],
            session: None,
            online_count: 3,
            tally: Tally::default(),
        };
        let parsed: serde_json::Value = serde_json::to_value(&update).unwrap();
        assert_eq!(parsed["type"], "state_update");
        assert_eq!(parsed["onlineCount"], 3);
        assert_eq!(parsed["seats"][0]["number"], 1);
        assert!(parsed["seats"][0]["occupantUserId"].is_null());
        assert!(parsed["session"].is_null());

        let count = ServerToClient::OnlineCount { count: 7 };
        let parsed = serde_json::to_value(&count).unwrap();
        assert_eq!(parsed, serde_json::json!({"type": "online_count", "n": 7}));

        let left = ServerToClient::UserLeft { user_id: "u1".to_string() };
        let parsed = serde_json::to_value(&left).unwrap();
        assert_eq!(parsed, serde_json::json!({"type": "user_left", "userId": "u1"}));
    }

    #[test]
    fn test_vote_wire_names() {
        assert_eq!(serde_json::to_string(&Vote::Favor).unwrap(), "\"favor\"");
        assert_eq!(serde_json::to_string(&Vote::Against).unwrap(), "\"against\"");
        assert_eq!(serde_json::to_string(&Vote::Abstain).unwrap(), "\"abstain\"");
    }

    #[test]
    fn test_seat_occupancy_helpers() {
        let mut seat = Seat::vacant(5);
        assert!(seat.is_vacant());
        seat.occupant_user_id = Some("u1".to_string());
        assert!(!seat.is_vacant());
        assert!(seat.is_occupied_by("u1"));
        assert!(!seat.is_occupied_by("u2"));
    }
}
