mod http_chat_transport;
mod mock_completion_client;
mod openai_compatible_client;

pub use http_chat_transport::*;
pub use mock_completion_client::*;
pub use openai_compatible_client::*;
