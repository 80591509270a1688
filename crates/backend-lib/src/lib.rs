// ============================
// chamber-backend-lib/src/lib.rs
// ============================
//! Core functionality for the chamber WebSocket server.

pub mod broadcast;
pub mod chamber_actor;
pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod seats;
pub mod session;
pub mod validation;
pub mod ws_router;

use std::sync::Arc;

use crate::chamber_actor::{spawn_chamber_actor, ChamberHandle};
use crate::config::Settings;

/// Application state shared across all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Handle to the actor that owns the chamber state
    pub chamber: ChamberHandle,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Spawn the chamber actor; must be called inside a tokio runtime
    pub fn new(settings: Settings) -> Self {
        let chamber = spawn_chamber_actor(settings.seat_count, settings.chat_capacity);
        Self {
            chamber,
            settings: Arc::new(settings),
        }
    }
}
