//! WebSocket handling for participant connections.
//!
//! Every text frame carries one JSON [`ClientMessage`]. Frames that fail to
//! decode are dropped without a reply; everything else is handed to the
//! [`Lobby`](crate::use_cases::Lobby) under its lock.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use gambit_domain::ConnectionId;
use gambit_protocol::{ClientMessage, ServerMessage};

use crate::app::App;

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<Arc<App>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, app: Arc<App>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();

    // Create a bounded channel for sending messages to this client
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(app.config.channel_buffer);

    app.lobby.lock().await.connect(connection_id, tx);

    // Spawn a task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize server message");
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match decode(text.as_str()) {
                Ok(msg) => handle_message(&app, connection_id, msg).await,
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Dropping undecodable message");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            // Binary frames carry nothing we understand; pings are answered by axum
            _ => {}
        }
    }

    // Clean up
    app.lobby.lock().await.disconnect(connection_id);
    send_task.abort();
}

fn decode(text: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// Dispatch a parsed client message to the lobby.
async fn handle_message(app: &App, connection_id: ConnectionId, msg: ClientMessage) {
    tracing::trace!(connection_id = %connection_id, ?msg, "Client message received");
    app.lobby.lock().await.handle_message(connection_id, msg);
}

// =============================================================================
// WebSocket Integration Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support;
