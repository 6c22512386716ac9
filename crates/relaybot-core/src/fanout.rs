//! Forward one user message to every operator.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use crate::{
    channel::{send_bare, send_captioned, Channel},
    content::{truncate_chars, Content, ContentView},
    conversation::ConversationStore,
    domain::{ChatId, InboundMessage, MessageId, UserId},
    header::{self, HeaderStyle},
    reply_table::ReplyTable,
    texts::Texts,
    Result,
};

/// Result of one fan-out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FanoutReport {
    pub confirmation_sent: bool,
    pub header_style: HeaderStyle,
    /// Operators that got the message, with every id recorded for them.
    pub delivered: Vec<(ChatId, Vec<MessageId>)>,
    pub failed: Vec<(ChatId, String)>,
    pub failure_notice_sent: bool,
}

impl FanoutReport {
    pub fn all_failed(&self) -> bool {
        self.delivered.is_empty() && !self.failed.is_empty()
    }
}

pub struct FanoutDispatcher {
    channel: Arc<dyn Channel>,
    conversations: Arc<ConversationStore>,
    table: Arc<ReplyTable>,
    operators: Vec<ChatId>,
    texts: Arc<Texts>,
}

impl FanoutDispatcher {
    pub fn new(
        channel: Arc<dyn Channel>,
        conversations: Arc<ConversationStore>,
        table: Arc<ReplyTable>,
        operators: Vec<ChatId>,
        texts: Arc<Texts>,
    ) -> Self {
        Self {
            channel,
            conversations,
            table,
            operators,
            texts,
        }
    }

    /// Callers must hold the sender's user lock: the confirmation flag is
    /// read and flipped here without further synchronization.
    pub async fn dispatch(&self, msg: &InboundMessage, now: &DateTime<FixedOffset>) -> FanoutReport {
        let user = msg.sender.user_id;
        let first = !self.conversations.state(user).await.first_confirmation_sent();
        let mut confirmation_sent = false;
        if first {
            match self.channel.send_text(msg.chat_id, &self.texts.confirmation).await {
                Ok(_) => confirmation_sent = true,
                Err(e) => warn!(user_id = user.0, "failed to send confirmation: {e}"),
            }
            self.conversations.mark_first_confirmation_sent(user).await;
        }

        let style = if first {
            HeaderStyle::Verbose
        } else {
            HeaderStyle::Compact
        };
        let mut report = FanoutReport {
            confirmation_sent,
            header_style: style,
            delivered: Vec::new(),
            failed: Vec::new(),
            failure_notice_sent: false,
        };
        let header: Arc<str> = header::render(&msg.sender, now, style).into();
        let content = Arc::new(msg.content.clone());

        // One task per operator; awaiting the handles in order only collects results.
        let handles = self
            .operators
            .iter()
            .map(|&operator| {
                let channel = self.channel.clone();
                let table = self.table.clone();
                let header = header.clone();
                let content = content.clone();
                let handle = tokio::spawn(async move {
                    deliver_to_operator(channel.as_ref(), &table, operator, user, &header, &content)
                        .await
                });
                (operator, handle)
            })
            .collect::<Vec<_>>();

        for (operator, handle) in handles {
            match handle.await {
                Ok(Ok(ids)) => report.delivered.push((operator, ids)),
                Ok(Err(e)) => {
                    warn!(operator_id = operator.0, user_id = user.0, "fan-out delivery failed: {e}");
                    report.failed.push((operator, e.to_string()));
                }
                Err(e) => {
                    warn!(operator_id = operator.0, user_id = user.0, "fan-out task failed: {e}");
                    report.failed.push((operator, e.to_string()));
                }
            }
        }

        if report.all_failed() {
            match self.channel.send_text(msg.chat_id, &self.texts.failure).await {
                Ok(_) => report.failure_notice_sent = true,
                Err(e) => warn!(user_id = user.0, "failed to send failure notice: {e}"),
            }
        }

        info!(
            user_id = user.0,
            username = msg.sender.handle(),
            kind = msg.content.kind_label(),
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "forwarded user message to operators"
        );
        report
    }
}

/// Deliver to a single operator, recording each resulting id as soon as it is known.
async fn deliver_to_operator(
    channel: &dyn Channel,
    table: &ReplyTable,
    operator: ChatId,
    user: UserId,
    header: &str,
    content: &Content,
) -> Result<Vec<MessageId>> {
    let mut recorded = Vec::new();

    let sent = match content.view() {
        ContentView::Text(text) => {
            let body = format!("{header}{}", text.unwrap_or_default());
            channel.send_text(operator, &body).await?
        }
        ContentView::Captioned {
            kind,
            file,
            caption,
        } => {
            let full = format!("{header}{}", caption.unwrap_or_default());
            let caption = truncate_chars(&full, kind.caption_limit());
            send_captioned(channel, operator, kind, file, Some(&caption)).await?
        }
        ContentView::Bare { kind, file } => {
            // No caption possible: the header goes out as its own notice first.
            let notice = channel.send_text(operator, header.trim()).await?;
            table.record(operator, notice.message_id, user).await;
            recorded.push(notice.message_id);
            send_bare(channel, operator, kind, file).await?
        }
    };

    table.record(operator, sent.message_id, user).await;
    recorded.push(sent.message_id);
    Ok(recorded)
}
