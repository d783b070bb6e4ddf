//! # Application Layer
//!
//! Use cases and the interfaces they depend on: the completion proxy flow
//! and the client-side conversation controller.

mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
