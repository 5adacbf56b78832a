//! Connection manager: active connection set and per-connection serve loop
//!
//! Each open connection owns an outbound queue. The queue's sender lives in
//! the active set, and every send (reply or broadcast) goes through the set
//! under the same lock that `disconnect` takes, so once a connection is
//! removed nothing can be queued for it any more. A writer task on the
//! transport side drains the queue and exits when the sender is dropped.

use chrono::Utc;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::messages::{Frame, ServerMessage, StreamRequest};
use crate::gateway::types::GenerationParams;
use crate::gateway::Dispatcher;

pub type ConnectionId = Uuid;

struct ConnectionHandle {
    client_id: String,
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

pub struct ConnectionManager {
    dispatcher: Arc<Dispatcher>,
    default_model: String,
    active: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionManager {
    pub fn new(dispatcher: Arc<Dispatcher>, default_model: impl Into<String>) -> Self {
        Self {
            dispatcher,
            default_model: default_model.into(),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Register an accepted connection. The returned receiver yields every
    /// message queued for this connection until it is disconnected.
    pub fn connect(&self, client_id: &str) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let (outbound, receiver) = mpsc::unbounded_channel();

        let active = {
            let mut active = self.active.lock();
            active.insert(
                id,
                ConnectionHandle {
                    client_id: client_id.to_string(),
                    outbound,
                },
            );
            active.len()
        };

        info!(connection = %id, client_id = %client_id, active = active, "Connection opened");
        (id, receiver)
    }

    /// Remove a connection from the active set. Returns false if it was not open.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.active.lock().remove(&id);

        match removed {
            Some(handle) => {
                info!(connection = %id, client_id = %handle.client_id, "Connection closed");
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self, id: ConnectionId) -> bool {
        self.active.lock().contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Queue a message for one open connection. Returns false if it is closed.
    pub fn send(&self, id: ConnectionId, message: ServerMessage) -> bool {
        let active = self.active.lock();
        match active.get(&id) {
            Some(handle) => handle.outbound.send(message).is_ok(),
            None => {
                debug!(connection = %id, "Dropping message for closed connection");
                false
            }
        }
    }

    /// Queue a message for every open connection; returns how many accepted it
    pub fn broadcast(&self, message: ServerMessage) -> usize {
        let active = self.active.lock();
        active
            .values()
            .filter(|handle| handle.outbound.send(message.clone()).is_ok())
            .count()
    }

    /// Turn one inbound text frame into a reply. Never fails: malformed
    /// payloads and dispatch errors become `Error` replies.
    pub async fn handle_text(&self, text: &str) -> ServerMessage {
        let request: StreamRequest = match serde_json::from_str(text) {
            Ok(request) => request,
            Err(e) => return ServerMessage::error(format!("invalid message: {}", e)),
        };

        let model = request.model.unwrap_or_else(|| self.default_model.clone());
        let params = GenerationParams::default();

        match self
            .dispatcher
            .dispatch(&model, request.provider.as_deref(), &request.messages, &params)
            .await
        {
            Ok(result) => ServerMessage::Response {
                content: result.text,
                model,
                provider: result.provider_used,
                timestamp: Utc::now().to_rfc3339(),
            },
            Err(e) => {
                warn!(model = %model, kind = e.kind(), error = %e, "Streaming dispatch failed");
                ServerMessage::error(e.to_string())
            }
        }
    }

    /// Serve an open connection until the peer closes it or the stream ends.
    /// Frames are handled one at a time, so replies keep receive order.
    pub async fn serve<S>(&self, id: ConnectionId, frames: S)
    where
        S: Stream<Item = Frame>,
    {
        tokio::pin!(frames);

        while let Some(frame) = frames.next().await {
            let text = match frame {
                Frame::Text(text) => text,
                Frame::Close => break,
            };

            let reply = self.handle_text(&text).await;
            if !self.send(id, reply) {
                break;
            }
        }

        self.disconnect(id);
    }
}
