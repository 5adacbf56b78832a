//! WebSocket upgrade handler bridging axum sockets to the connection manager

use crate::connection::{ConnectionManager, Frame};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, error};

/// Upgrade `/ws/{client_id}` to a persistent session
pub async fn websocket(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let connections = state.connections.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, connections))
}

async fn handle_socket(socket: WebSocket, client_id: String, connections: Arc<ConnectionManager>) {
    let (mut sink, stream) = socket.split();
    let (id, mut outbound) = connections.connect(&client_id);

    // Writer: drains the outbound queue until the connection leaves the active set
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to serialize server message");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let frames = stream.filter_map(|incoming| async move {
        match incoming {
            Ok(WsMessage::Text(text)) => Some(Frame::Text(text)),
            Ok(WsMessage::Close(_)) => Some(Frame::Close),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "WebSocket receive failed");
                Some(Frame::Close)
            }
        }
    });

    connections.serve(id, frames).await;

    if let Err(e) = writer.await {
        debug!(connection = %id, error = %e, "Writer task ended abnormally");
    }
}
