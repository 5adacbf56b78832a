//! Wire messages exchanged over a persistent connection

use serde::{Deserialize, Serialize};

use crate::gateway::types::Message;

/// Inbound request on an open connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Outbound reply on an open connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Response {
        content: String,
        model: String,
        provider: String,
        timestamp: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ServerMessage::Error { .. })
    }
}

/// Transport-neutral inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close,
}
