use crate::content::Content;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
///
/// Private chats share the id of the user on the other side, which is how
/// operators and end-users are addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric, unique per chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl From<UserId> for ChatId {
    fn from(u: UserId) -> Self {
        ChatId(u.0)
    }
}

/// Display attributes of whoever sent an inbound message.
///
/// Carried per message and never stored: users may rename themselves between
/// two messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    pub fn new(user_id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
        }
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Handle used in logs and audit entries.
    pub fn handle(&self) -> &str {
        self.username.as_deref().unwrap_or("unknown")
    }
}

/// One inbound message, already classified.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    /// Chat the message arrived in (the operator session for operator replies).
    pub chat_id: ChatId,
    pub sender: Sender,
    pub content: Content,
    pub reply_to: Option<MessageId>,
}

impl InboundMessage {
    pub fn new(chat_id: ChatId, sender: Sender, content: Content) -> Self {
        Self {
            chat_id,
            sender,
            content,
            reply_to: None,
        }
    }

    pub fn replying_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}
