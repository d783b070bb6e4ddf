mod complete_chat;
mod conversation_controller;
mod frame_decoder;

pub use complete_chat::*;
pub use conversation_controller::*;
pub use frame_decoder::*;
