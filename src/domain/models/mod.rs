mod conversation;
mod message;
mod model_catalog;
mod wire;

pub use conversation::*;
pub use message::*;
pub use model_catalog::*;
pub use wire::*;
