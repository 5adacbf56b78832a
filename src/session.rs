//! In-memory chat session store

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::types::Message;

/// A stored conversation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub model: String,
    pub provider: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Sessions keyed by id; contents are lost on restart
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, ChatSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, title: String, model: String, provider: String) -> ChatSession {
        let now = Utc::now().to_rfc3339();
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            title,
            messages: Vec::new(),
            model,
            provider,
            created_at: now.clone(),
            updated_at: now,
        };

        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Result<ChatSession> {
        self.sessions
            .get(id)
            .map(|s| s.value().clone())
            .ok_or_else(|| AppError::NotFound("Session".to_string()))
    }

    /// All sessions, oldest first
    pub fn list(&self) -> Vec<ChatSession> {
        let mut sessions: Vec<ChatSession> =
            self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sessions
    }

    /// Append a message, stamping it and the session with the current time
    pub fn add_message(&self, id: &str, mut message: Message) -> Result<()> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Session".to_string()))?;

        let now = Utc::now().to_rfc3339();
        message.timestamp = Some(now.clone());
        session.messages.push(message);
        session.updated_at = now;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Session".to_string()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
