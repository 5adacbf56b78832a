//! API module - HTTP routes, handlers, models and the WebSocket endpoint

pub mod chat_handlers;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod ws;
