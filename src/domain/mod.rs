//! # Domain Layer
//!
//! Conversation models, wire types and the model catalog.
//! This layer is independent of external frameworks and infrastructure.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
