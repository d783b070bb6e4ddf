use super::{Message, WireMessage};
use crate::domain::DomainError;

/// Where the conversation is in the request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    /// Request dispatched, reply kind not yet known.
    Sending,
    /// Event-stream reply being ingested frame by frame.
    Streaming,
}

impl SendPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendPhase::Idle => "idle",
            SendPhase::Sending => "sending",
            SendPhase::Streaming => "streaming",
        }
    }
}

/// Ordered message list plus the request flags of a single chat session.
///
/// Every mutation goes through a method that checks the current
/// [`SendPhase`]; illegal transitions return [`DomainError::InvalidState`].
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    phase: SendPhase,
    last_error: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase != SendPhase::Idle
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Role/content history, as sent over the wire.
    pub fn history(&self) -> Vec<WireMessage> {
        self.messages.iter().map(WireMessage::from).collect()
    }

    /// Idle -> Sending. Appends `user` then `placeholder` and clears the
    /// previous error.
    pub fn begin_send(&mut self, user: Message, placeholder: Message) -> Result<(), DomainError> {
        if self.phase != SendPhase::Idle {
            return Err(DomainError::invalid_state(format!(
                "cannot send while {}",
                self.phase.as_str()
            )));
        }
        self.messages.push(user);
        self.messages.push(placeholder);
        self.last_error = None;
        self.phase = SendPhase::Sending;
        Ok(())
    }

    /// Sending -> Streaming.
    pub fn begin_streaming(&mut self) -> Result<(), DomainError> {
        if self.phase != SendPhase::Sending {
            return Err(DomainError::invalid_state(format!(
                "cannot start streaming while {}",
                self.phase.as_str()
            )));
        }
        self.phase = SendPhase::Streaming;
        Ok(())
    }

    /// Replace the content of the in-progress message `id`.
    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> Result<(), DomainError> {
        if self.phase == SendPhase::Idle {
            return Err(DomainError::invalid_state("no reply in progress"));
        }
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or_else(|| DomainError::invalid_state(format!("unknown message {}", id)))?;
        message.set_content(content);
        Ok(())
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    /// Sending/Streaming -> Idle.
    pub fn finish(&mut self) -> Result<(), DomainError> {
        if self.phase == SendPhase::Idle {
            return Err(DomainError::invalid_state("no send to finish"));
        }
        self.phase = SendPhase::Idle;
        Ok(())
    }

    /// Drop all messages and the last error. Only valid while idle.
    pub fn clear(&mut self) -> Result<(), DomainError> {
        if self.phase != SendPhase::Idle {
            return Err(DomainError::invalid_state(format!(
                "cannot clear while {}",
                self.phase.as_str()
            )));
        }
        self.messages.clear();
        self.last_error = None;
        Ok(())
    }
}
