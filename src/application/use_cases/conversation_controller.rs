use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::frame_decoder::{parse_frame, FrameDecoder};
use crate::application::{ByteStream, ChatTransport, ResponseKind, TransportResponse};
use crate::domain::{
    ChatRequest, ChatResponse, ConversationState, DomainError, Message, StreamFrame, WireMessage,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Content used when a structured reply carries neither `content` nor `error`.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response received.";

/// One of these replaces the assistant message whenever a send fails.
pub const FALLBACK_REPLIES: &[&str] = &[
    "Sorry, I couldn't get a response this time. Please try again.",
    "Something went wrong on my end. Could you send that again?",
    "I'm having trouble answering right now. Please retry in a moment.",
    "That request didn't go through. Let's give it another try.",
];

/// State change emitted to the render side, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationUpdate {
    MessageAppended(Message),
    ContentUpdated { id: String, content: String },
    ErrorRecorded(String),
    LoadingChanged(bool),
    /// The entry field may accept input again.
    InputReady,
    Cleared,
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Empty input, or a send was already in flight. Nothing changed.
    Ignored,
    Completed,
    Failed(DomainError),
}

impl SendOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, SendOutcome::Ignored)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed)
    }

    pub fn error(&self) -> Option<&DomainError> {
        match self {
            SendOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Client side of the chat: owns the [`ConversationState`] and drives one
/// request/response cycle per [`send`](Self::send).
///
/// Replies are ingested either as a single JSON document or as an event
/// stream, depending on the declared content type. Every visible change is
/// published as a [`ConversationUpdate`] to the subscriber, if any. On any
/// failure the in-progress assistant message is replaced by one of
/// [`FALLBACK_REPLIES`] and the error text is kept in `last_error`.
pub struct ConversationController {
    transport: Arc<dyn ChatTransport>,
    model: String,
    timeout: Duration,
    state: ConversationState,
    updates: Option<mpsc::UnboundedSender<ConversationUpdate>>,
}

impl ConversationController {
    pub fn new(transport: Arc<dyn ChatTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            state: ConversationState::new(),
            updates: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start receiving updates. Replaces any previous subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConversationUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.updates = Some(tx);
        rx
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn send(&mut self, input: &str) -> SendOutcome {
        self.send_with_cancel(input, CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), but aborts early if `cancel` fires. The
    /// deadline also cancels `cancel`, so holders of a clone observe it.
    pub async fn send_with_cancel(&mut self, input: &str, cancel: CancellationToken) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() || self.state.is_loading() {
            debug!(
                "Ignoring send (empty={}, loading={})",
                text.is_empty(),
                self.state.is_loading()
            );
            return SendOutcome::Ignored;
        }

        let user = Message::user(text);
        let placeholder = Message::assistant_placeholder();
        let reply_id = placeholder.id().to_string();

        let mut history = self.state.history();
        history.push(WireMessage::from(&user));
        let request = ChatRequest::new(history, self.model.clone());

        if let Err(e) = self.state.begin_send(user.clone(), placeholder.clone()) {
            warn!("Rejected send: {}", e);
            return SendOutcome::Ignored;
        }
        self.emit(ConversationUpdate::MessageAppended(user));
        self.emit(ConversationUpdate::MessageAppended(placeholder));
        self.emit(ConversationUpdate::LoadingChanged(true));

        let mut guard = SendGuard {
            controller: self,
            reply_id,
            armed: true,
        };
        let result = guard
            .controller
            .dispatch(&guard.reply_id, &request, &cancel)
            .await;
        guard.settle(result)
    }

    /// Drop every message and the last error. Rejected while a send is in
    /// flight.
    pub fn clear(&mut self) -> Result<(), DomainError> {
        self.state.clear()?;
        self.emit(ConversationUpdate::Cleared);
        Ok(())
    }

    async fn dispatch(
        &mut self,
        reply_id: &str,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let deadline = self.timeout;

        tokio::select! {
            result = self.exchange(reply_id, request) => result,
            _ = tokio::time::sleep(deadline) => {
                cancel.cancel();
                warn!("Chat request exceeded {:?}, aborting", deadline);
                Err(DomainError::Timeout)
            }
            _ = cancel.cancelled() => {
                info!("Chat request cancelled");
                Err(DomainError::Cancelled)
            }
        }
    }

    async fn exchange(&mut self, reply_id: &str, request: &ChatRequest) -> Result<(), DomainError> {
        let transport = Arc::clone(&self.transport);
        let response = transport.post(request).await?;

        if !response.is_success() {
            let status = response.status;
            let body = response.into_text().await?;
            return Err(DomainError::HttpStatus { status, body });
        }

        match response.kind() {
            ResponseKind::Document => self.ingest_document(reply_id, response).await,
            ResponseKind::EventStream => self.ingest_stream(reply_id, response.body).await,
            ResponseKind::Other(declared) => Err(DomainError::UnexpectedFormat(if declared.is_empty() {
                "missing content type".to_string()
            } else {
                declared
            })),
        }
    }

    async fn ingest_document(
        &mut self,
        reply_id: &str,
        response: TransportResponse,
    ) -> Result<(), DomainError> {
        let body = response.into_bytes().await?;
        let document: ChatResponse = serde_json::from_slice(&body)?;

        if let Some(error) = document.error {
            return Err(DomainError::remote(error));
        }

        let content = document
            .content
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string());
        self.update_content(reply_id, content)
    }

    async fn ingest_stream(&mut self, reply_id: &str, mut body: ByteStream) -> Result<(), DomainError> {
        self.state.begin_streaming()?;

        let mut decoder = FrameDecoder::new();
        let mut accumulated = String::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for frame in decoder.push(&chunk) {
                self.apply_frame(reply_id, &frame, &mut accumulated)?;
            }
        }
        for frame in decoder.finish() {
            self.apply_frame(reply_id, &frame, &mut accumulated)?;
        }

        debug!("Stream finished ({} chars)", accumulated.len());
        Ok(())
    }

    fn apply_frame(
        &mut self,
        reply_id: &str,
        raw: &str,
        accumulated: &mut String,
    ) -> Result<(), DomainError> {
        match parse_frame(raw) {
            None => Ok(()),
            Some(Err(e)) => {
                warn!("Skipping malformed stream frame: {} ({:?})", e, raw);
                Ok(())
            }
            Some(Ok(StreamFrame::Text(delta))) => {
                accumulated.push_str(&delta);
                self.update_content(reply_id, accumulated.clone())
            }
            Some(Ok(StreamFrame::Error(message))) => Err(DomainError::remote(message)),
        }
    }

    fn update_content(&mut self, reply_id: &str, content: String) -> Result<(), DomainError> {
        self.state.set_content(reply_id, content.clone())?;
        self.emit(ConversationUpdate::ContentUpdated {
            id: reply_id.to_string(),
            content,
        });
        Ok(())
    }

    fn fail(&mut self, reply_id: &str, error: &DomainError) {
        warn!("Chat request failed: {}", error);

        let message = error.to_string();
        self.state.record_error(message.clone());
        self.emit(ConversationUpdate::ErrorRecorded(message));

        let fallback = FALLBACK_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(FALLBACK_REPLIES[0]);
        if let Err(e) = self.update_content(reply_id, fallback.to_string()) {
            warn!("Could not write fallback reply: {}", e);
        }
    }

    fn complete(&mut self) {
        if let Err(e) = self.state.finish() {
            warn!("Finishing send: {}", e);
        }
        self.emit(ConversationUpdate::LoadingChanged(false));
        self.emit(ConversationUpdate::InputReady);
    }

    fn emit(&self, update: ConversationUpdate) {
        if let Some(tx) = &self.updates {
            // A dropped receiver only means nobody is rendering.
            let _ = tx.send(update);
        }
    }
}

/// Finalizes a send exactly once. If the send future is dropped before it
/// settles, the reply is failed as cancelled and loading is cleared on drop.
struct SendGuard<'a> {
    controller: &'a mut ConversationController,
    reply_id: String,
    armed: bool,
}

impl SendGuard<'_> {
    fn settle(mut self, result: Result<(), DomainError>) -> SendOutcome {
        self.armed = false;
        let outcome = match result {
            Ok(()) => SendOutcome::Completed,
            Err(e) => {
                self.controller.fail(&self.reply_id, &e);
                SendOutcome::Failed(e)
            }
        };
        self.controller.complete();
        outcome
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Send dropped before it finished");
            self.controller.fail(&self.reply_id, &DomainError::Cancelled);
            self.controller.complete();
        }
    }
}
