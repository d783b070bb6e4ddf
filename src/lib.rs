pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    ChatTransport, CompleteChatUseCase, CompletionClient, CompletionOutcome,
    ConversationController, ConversationUpdate, FrameDecoder, SendOutcome, TransportResponse,
};

pub use cli::{ClientArgs, Commands};

pub use connector::{HttpChatTransport, MockCompletionClient, OpenAiCompatibleClient};

pub use domain::{
    ChatRequest, ChatResponse, ConversationState, DomainError, Message, ModelCatalog, Role,
    SendPhase, StreamFrame, WireMessage,
};
