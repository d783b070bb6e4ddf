//! Terminal front end for the conversation controller.

mod chat_session;

pub use chat_session::{run_interactive, run_single};
