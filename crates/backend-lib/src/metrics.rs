// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_ACTIVE: &str = "ws.active";
pub const EVENT_ACCEPTED: &str = "chamber.event.accepted";
pub const EVENT_REJECTED: &str = "chamber.event.rejected";
pub const EVENT_UNDECODABLE: &str = "chamber.event.undecodable";
pub const USERS_JOINED: &str = "chamber.users";
pub const VOTES_CAST: &str = "chamber.votes.cast";
pub const CHAT_MESSAGES: &str = "chamber.chat.messages";
