//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Upstream completion clients (OpenAI-compatible HTTP, offline mock)
//! - HTTP transport used by the conversation controller
//! - The `/api/chat` HTTP server
//! - The terminal chat front end

pub mod adapter;
pub mod api;
pub mod terminal;

pub use adapter::*;
