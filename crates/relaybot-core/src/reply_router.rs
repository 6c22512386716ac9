//! Deliver operator replies back to the user they answer.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    channel::{send_bare, send_captioned, Channel},
    content::{Content, ContentView},
    domain::{ChatId, InboundMessage, MessageId, MessageRef, UserId},
    reply_table::ReplyTable,
    texts::Texts,
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Operator message that is not a reply; nothing is relayed.
    NotAReply,
    /// Reply to a message the relay never forwarded.
    Unresolved { reply_to: MessageId },
    Delivered { user: UserId, message: MessageRef },
    Failed { user: UserId, error: String },
}

pub struct ReplyRouter {
    channel: Arc<dyn Channel>,
    table: Arc<ReplyTable>,
    texts: Arc<Texts>,
}

impl ReplyRouter {
    pub fn new(channel: Arc<dyn Channel>, table: Arc<ReplyTable>, texts: Arc<Texts>) -> Self {
        Self {
            channel,
            table,
            texts,
        }
    }

    /// `msg` must come from an operator; the engine checks that.
    pub async fn route(&self, msg: &InboundMessage) -> ReplyOutcome {
        let Some(reply_to) = msg.reply_to else {
            debug!(operator_id = msg.sender.user_id.0, "operator message is not a reply");
            return ReplyOutcome::NotAReply;
        };

        let Some(user) = self.table.resolve(msg.chat_id, reply_to).await else {
            debug!(
                operator_id = msg.sender.user_id.0,
                reply_to = reply_to.0,
                "reply target is not a relayed message"
            );
            return ReplyOutcome::Unresolved { reply_to };
        };

        let result = self.deliver(user.into(), &msg.content).await;

        let ack = match &result {
            Ok(_) => self.texts.reply_ack.clone(),
            Err(e) => self.texts.reply_failed(&e.to_string()),
        };
        if let Err(e) = self.channel.send_text(msg.chat_id, &ack).await {
            warn!(operator_id = msg.sender.user_id.0, "failed to acknowledge reply: {e}");
        }

        match result {
            Ok(message) => {
                info!(
                    operator_id = msg.sender.user_id.0,
                    user_id = user.0,
                    kind = msg.content.kind_label(),
                    "delivered operator reply"
                );
                ReplyOutcome::Delivered { user, message }
            }
            Err(e) => {
                warn!(
                    operator_id = msg.sender.user_id.0,
                    user_id = user.0,
                    "failed to deliver operator reply: {e}"
                );
                ReplyOutcome::Failed {
                    user,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Same kind in, same kind out; no header on the user side.
    async fn deliver(&self, chat_id: ChatId, content: &Content) -> Result<MessageRef> {
        let channel = self.channel.as_ref();
        match content.view() {
            ContentView::Text(text) => {
                let text = text
                    .filter(|t| !t.is_empty())
                    .unwrap_or(self.texts.operator_reply_fallback.as_str());
                channel.send_text(chat_id, text).await
            }
            ContentView::Captioned {
                kind,
                file,
                caption,
            } => send_captioned(channel, chat_id, kind, file, caption).await,
            ContentView::Bare { kind, file } => send_bare(channel, chat_id, kind, file).await,
        }
    }
}
