use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn};

use crate::application::{CompleteChatUseCase, INTERNAL_FAILURE_REPLY};
use crate::domain::{ChatResponse, DomainError};

use super::super::Container;

/// Status and JSON body returned by `/api/chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub status: StatusCode,
    pub body: ChatResponse,
}

impl ChatReply {
    fn ok(body: ChatResponse) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Map a failure onto the endpoint's status policy: request-shape errors
    /// are 400, a missing credential is 500, everything else is a 200 that
    /// still carries renderable content.
    fn from_error(e: DomainError) -> Self {
        if e.is_client_error() {
            info!("Rejected chat request: {}", e);
            Self {
                status: StatusCode::BAD_REQUEST,
                body: ChatResponse::error(e.to_string()),
            }
        } else if e.is_configuration_error() {
            error!("Chat request failed: {}", e);
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: ChatResponse::error(e.to_string()),
            }
        } else {
            warn!("Chat request failed internally: {}", e);
            Self::ok(ChatResponse::degraded(e.to_string(), INTERNAL_FAILURE_REPLY))
        }
    }
}

impl IntoResponse for ChatReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn chat(&self, body: &[u8]) -> ChatReply {
        let request = match CompleteChatUseCase::parse_request(body) {
            Ok(request) => request,
            Err(e) => return ChatReply::from_error(e),
        };

        let use_case = self.container.complete_chat_use_case();
        match use_case.execute(request).await {
            Ok(outcome) => ChatReply::ok(ChatResponse::content(outcome.content)),
            Err(e) => ChatReply::from_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::connector::adapter::MockCompletionClient;

    fn container() -> Container {
        Container::with_client(Arc::new(MockCompletionClient::new()))
    }

    #[tokio::test]
    async fn valid_request_returns_content() {
        let container = container();
        let reply = ChatController::new(&container)
            .chat(br#"{"messages":[{"role":"user","content":"ping"}],"model":"mistral"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.error.is_none());
        assert!(reply.body.content.unwrap().ends_with("You said: ping"));
    }

    #[tokio::test]
    async fn garbage_body_is_200_with_error_and_content() {
        let container = container();
        let reply = ChatController::new(&container).chat(b"{{{").await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.error.is_some());
        assert_eq!(reply.body.content.as_deref(), Some(INTERNAL_FAILURE_REPLY));
    }

    #[tokio::test]
    async fn unknown_model_is_400() {
        let container = container();
        let reply = ChatController::new(&container)
            .chat(br#"{"messages":[],"model":"nope"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body.error.as_deref(), Some("Invalid model: nope"));
        assert!(reply.body.content.is_none());
    }
}
