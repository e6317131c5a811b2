pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::reply::Reply;

/// A message received from the chat transport
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Numeric id of the sending user, checked against the allow-list
    pub sender_id: u64,
    /// Chat the reply goes to
    pub chat_id: i64,
    /// The message text
    pub text: String,
}

/// Capability to deliver a reply into a chat.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, chat_id: i64, reply: Reply) -> Result<()>;
}
