// ============================
// chamber-backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chamber_common::{ClientToServer, ServerToClient};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, warn};

use crate::error::AppError;
use crate::metrics::{EVENT_UNDECODABLE, WS_ACTIVE, WS_CONNECTION};
use crate::AppState;

/// Create the application router: `/ws`, `/health`, `/api/state` and,
/// when configured, static files for everything else.
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = state.settings.clone();

    let mut router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/state", get(current_state))
        .with_state(state);

    if let Some(dir) = &settings.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    if settings.cors_allow_any {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST]),
        );
    }

    router.layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

/// Current snapshot as JSON
async fn current_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ServerToClient>, AppError> {
    Ok(Json(state.chamber.snapshot().await?))
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let (connection_id, mut outbound_rx) = match state.chamber.connect() {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "refusing connection");
            return;
        },
    };
    counter!(WS_CONNECTION).increment(1);
    gauge!(WS_ACTIVE).increment(1.0);

    let (mut tx, mut rx) = socket.split();

    // Task 1: Drain this connection's queue onto the socket
    let send_task = tokio::spawn(async move {
        while let Some(server_msg) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&server_msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(%connection_id, error = %e, "failed to serialize message");
                    continue;
                },
            };
            if tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Main task: Forward incoming frames to the actor in arrival order
    while let Some(Ok(message)) = rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientToServer>(text.as_str()) {
                Ok(event) => {
                    if let Err(e) = state.chamber.send_event(connection_id, event) {
                        error!(%connection_id, error = %e, "chamber unavailable");
                        break;
                    }
                },
                Err(e) => {
                    counter!(EVENT_UNDECODABLE).increment(1);
                    warn!(%connection_id, error = %e, "ignoring undecodable frame");
                },
            },
            Message::Close(_) => break,
            _ => {}, // Ignore binary and control frames
        }
    }

    // Cleanup: the actor frees the seat and tells everyone
    if let Err(e) = state.chamber.disconnect(connection_id) {
        error!(%connection_id, error = %e, "failed to report disconnect");
    }

    gauge!(WS_ACTIVE).decrement(1.0);

    // Cancel the send task
    send_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let settings = Settings {
            static_dir: None,
            seat_count: 8,
            ..Settings::default()
        };
        create_router(Arc::new(AppState::new(settings)))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_state_endpoint() {
        let response = app()
            .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["type"], "snapshot");
        assert_eq!(body["seats"].as_array().unwrap().len(), 8);
        assert!(body["session"].is_null());
        assert_eq!(body["onlineCount"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_without_static_dir() {
        let response = app()
            .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
