//! Outbound actions the gate needs from the chat platform.

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId, UserId};
use thiserror::Error;

/// Failure of a single call to the chat platform.
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("audit sink is not configured")]
    NoLogChat,
    #[allow(dead_code)]
    #[error("{0}")]
    Other(String),
}

/// What the gate knows about a member when addressing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub display_name: String,
    pub username: Option<String>,
}

impl MemberProfile {
    pub fn new(display_name: impl Into<String>, username: Option<String>) -> Self {
        Self {
            display_name: display_name.into(),
            username,
        }
    }
}

#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    /// Post `text` to `chat`, returning the id of the new message.
    async fn send_message(&self, chat: ChatId, text: String) -> Result<MessageId, MessengerError>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), MessengerError>;

    /// Ban `user` from `chat`. Removal is the whole point of a timeout, so
    /// callers treat a failure here as the end of that removal attempt.
    async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<(), MessengerError>;

    async fn fetch_member(&self, chat: ChatId, user: UserId)
        -> Result<MemberProfile, MessengerError>;

    /// Fire-and-forget audit line.
    async fn send_log(&self, text: String) -> Result<(), MessengerError>;
}
