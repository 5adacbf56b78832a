//! Persistent connection handling

pub mod manager;
pub mod messages;

pub use manager::{ConnectionId, ConnectionManager};
pub use messages::{Frame, ServerMessage, StreamRequest};
