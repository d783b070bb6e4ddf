mod chat_transport;
mod completion_client;

pub use chat_transport::*;
pub use completion_client::*;
